//! ISO 639-1 display names and the right-to-left language list

use icu_locale::Locale;

/// Language codes and their display names
pub static LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("aa", "Afar"),
    ("ab", "Abkhazian"),
    ("af", "Afrikaans"),
    ("am", "Amharic"),
    ("ar", "Arabic"),
    ("as", "Assamese"),
    ("ay", "Aymara"),
    ("az", "Azerbaijani"),
    ("ba", "Bashkir"),
    ("be", "Byelorussian"),
    ("bg", "Bulgarian"),
    ("bh", "Bihari"),
    ("bi", "Bislama"),
    ("bn", "Bengali/Bangla"),
    ("bo", "Tibetan"),
    ("br", "Breton"),
    ("ca", "Catalan"),
    ("co", "Corsican"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("dz", "Bhutani"),
    ("el", "Greek"),
    ("eo", "Esperanto"),
    ("es", "Español"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fj", "Fiji"),
    ("fo", "Faeroese"),
    ("fr", "French"),
    ("fy", "Frisian"),
    ("ga", "Irish"),
    ("gd", "Scots/Gaelic"),
    ("gl", "Galician"),
    ("gn", "Guarani"),
    ("gu", "Gujarati"),
    ("ha", "Hausa"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("hy", "Armenian"),
    ("ia", "Interlingua"),
    ("ie", "Interlingue"),
    ("ik", "Inupiak"),
    ("in", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("iw", "Hebrew"),
    ("ja", "Japanese"),
    ("ji", "Yiddish"),
    ("jw", "Javanese"),
    ("ka", "Georgian"),
    ("kk", "Kazakh"),
    ("kl", "Greenlandic"),
    ("km", "Cambodian"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("ks", "Kashmiri"),
    ("ku", "Kurdish"),
    ("ky", "Kirghiz"),
    ("la", "Latin"),
    ("ln", "Lingala"),
    ("lo", "Laothian"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian/Lettish"),
    ("mg", "Malagasy"),
    ("mi", "Maori"),
    ("mk", "Macedonian"),
    ("ml", "Malayalam"),
    ("mn", "Mongolian"),
    ("mo", "Moldavian"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("mt", "Maltese"),
    ("my", "Burmese"),
    ("na", "Nauru"),
    ("ne", "Nepali"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("oc", "Occitan"),
    ("om", "(Afan)/Oromoor/Oriya"),
    ("pa", "Punjabi"),
    ("pl", "Polish"),
    ("ps", "Pashto/Pushto"),
    ("pt", "Portuguese"),
    ("qu", "Quechua"),
    ("rm", "Rhaeto-Romance"),
    ("rn", "Kirundi"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("rw", "Kinyarwanda"),
    ("sa", "Sanskrit"),
    ("sd", "Sindhi"),
    ("sg", "Sangro"),
    ("sh", "Serbo-Croatian"),
    ("si", "Singhalese"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sm", "Samoan"),
    ("sn", "Shona"),
    ("so", "Somali"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("ss", "Siswati"),
    ("st", "Sesotho"),
    ("su", "Sundanese"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Tegulu"),
    ("tg", "Tajik"),
    ("th", "Thai"),
    ("ti", "Tigrinya"),
    ("tk", "Turkmen"),
    ("tl", "Tagalog"),
    ("tn", "Setswana"),
    ("to", "Tonga"),
    ("tr", "Turkish"),
    ("ts", "Tsonga"),
    ("tt", "Tatar"),
    ("tw", "Twi"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("uz", "Uzbek"),
    ("vi", "Vietnamese"),
    ("vo", "Volapuk"),
    ("wo", "Wolof"),
    ("xh", "Xhosa"),
    ("yo", "Yoruba"),
    ("zh", "Chinese"),
    ("zu", "Zulu"),
];

/// Languages written right to left
pub static RTL_LANGUAGES: &[&str] = &[
    "ar", "arc", "bcc", "bqi", "ckb", "dv", "fa", "glk", "he", "ku", "mzn", "pnb", "ps", "sd",
    "ug", "ur", "yi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Direction {
    /// Value for an HTML `dir` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::LeftToRight => "ltr",
            Direction::RightToLeft => "rtl",
        }
    }
}

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Writing direction of a language code
///
/// Only the language subtag counts, so `ar-EG` is right to left.
pub fn direction(code: &str) -> Direction {
    let language = match code.parse::<Locale>() {
        Ok(locale) => locale.id.language.as_str().to_string(),
        Err(_) => code.to_ascii_lowercase(),
    };

    if RTL_LANGUAGES.contains(&language.as_str()) {
        Direction::RightToLeft
    } else {
        Direction::LeftToRight
    }
}

/// `(code, name)` pairs for the given codes, sorted by display name
///
/// Codes without a known name are left out.
pub fn names_for<S: AsRef<str>>(codes: &[S]) -> Vec<(String, String)> {
    let mut names: Vec<(String, String)> = LANGUAGE_NAMES
        .iter()
        .filter(|(code, _)| codes.iter().any(|c| c.as_ref() == *code))
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();
    names.sort_by(|a, b| a.1.cmp(&b.1));
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        assert_eq!(direction("ar"), Direction::RightToLeft);
        assert_eq!(direction("ar-EG"), Direction::RightToLeft);
        assert_eq!(direction("he"), Direction::RightToLeft);
        assert_eq!(direction("en"), Direction::LeftToRight);
        assert_eq!(direction("not a code"), Direction::LeftToRight);
        assert_eq!(Direction::RightToLeft.as_str(), "rtl");
    }

    #[test]
    fn test_names_sorted_by_name() {
        let names = names_for(&["es", "de", "en", "xx"]);
        assert_eq!(
            names,
            vec![
                ("en".to_string(), "English".to_string()),
                ("es".to_string(), "Español".to_string()),
                ("de".to_string(), "German".to_string()),
            ]
        );
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("fr"), Some("French"));
        assert_eq!(language_name("zz"), None);
    }
}
