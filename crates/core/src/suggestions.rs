use crate::models::{Language, UrgencyTier};

type TierTable = [[&'static str; 3]; 3];

const ENGLISH: TierTable = [
    [
        "Get plenty of rest",
        "Stay hydrated",
        "Monitor your condition",
    ],
    [
        "Monitor symptoms closely",
        "Stay hydrated and rest",
        "Consult doctor if symptoms persist",
    ],
    [
        "Seek immediate medical attention",
        "Call emergency services if symptoms worsen",
        "Do not delay treatment",
    ],
];

const HINDI: TierTable = [
    [
        "भरपूर आराम करें",
        "हाइड्रेटेड रहें",
        "अपनी स्थिति पर नज़र रखें",
    ],
    [
        "लक्षणों पर बारीकी से नज़र रखें",
        "हाइड्रेटेड रहें और आराम करें",
        "लक्षण बने रहने पर डॉक्टर से सलाह लें",
    ],
    [
        "तुरंत चिकित्सा सहायता लें",
        "लक्षण बिगड़ने पर आपातकालीन सेवा कॉल करें",
        "इलाज में देरी न करें",
    ],
];

const MARATHI: TierTable = [
    [
        "भरपूर विश्रांती घ्या",
        "हायड्रेटेड राहा",
        "तुमच्या स्थितीवर लक्ष ठेवा",
    ],
    [
        "लक्षणांवर बारकाईने लक्ष ठेवा",
        "हायड्रेटेड राहा आणि विश्रांती घ्या",
        "लक्षणे कायम राहिल्यास डॉक्टरांचा सल्ला घ्या",
    ],
    [
        "तातडीने वैद्यकीय मदत घ्या",
        "लक्षणे वाढल्यास आपत्कालीन सेवा कॉल करा",
        "उपचारात विलंब करू नका",
    ],
];

fn table_for(language: Language) -> &'static TierTable {
    match language {
        Language::English => &ENGLISH,
        Language::Hindi => &HINDI,
        Language::Marathi => &MARATHI,
    }
}

fn tier_index(tier: UrgencyTier) -> usize {
    match tier {
        UrgencyTier::Low => 0,
        UrgencyTier::Medium => 1,
        UrgencyTier::High => 2,
    }
}

/// Fixed, localised next steps for a tier. Always three entries.
pub fn select_suggestions(tier: UrgencyTier, language: Language) -> Vec<String> {
    table_for(language)[tier_index(tier)]
        .iter()
        .map(|item| item.to_string())
        .collect()
}

/// String-keyed variant for callers holding raw tier and language keys.
/// Unknown languages use English, unknown tiers use the `low` list.
pub fn select_suggestions_by_key(tier: &str, language: &str) -> Vec<String> {
    let tier = UrgencyTier::parse(tier).unwrap_or(UrgencyTier::Low);
    select_suggestions(tier, Language::from_key(Some(language)))
}
