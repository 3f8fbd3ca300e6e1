use crate::models::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageTemplate {
    pub system_prompt: &'static str,
    pub disclaimer: &'static str,
}

const ENGLISH: LanguageTemplate = LanguageTemplate {
    system_prompt: "You are a healthcare guidance assistant. The user will describe symptoms. \n\
Respond with:\n\
- Possible common conditions\n\
- Urgency level (low, medium, high)\n\
- 2-3 actionable next steps\n\
- Short, clear language\n\
Always include a disclaimer: \"Consult a licensed doctor for accurate diagnosis.\"",
    disclaimer: "Consult a licensed doctor for accurate diagnosis.",
};

const HINDI: LanguageTemplate = LanguageTemplate {
    system_prompt: "आप एक स्वास्थ्य मार्गदर्शन सहायक हैं। उपयोगकर्ता लक्षणों का वर्णन करेगा।\n\
जवाब दें:\n\
- संभावित सामान्य स्थितियां\n\
- तात्कालिकता स्तर (कम, मध्यम, उच्च)\n\
- 2-3 कार्यात्मक अगले कदम\n\
- छोटी, स्पष्ट भाषा\n\
हमेशा एक अस्वीकरण शामिल करें: \"सटीक निदान के लिए लाइसेंस प्राप्त डॉक्टर से सलाह लें।\"",
    disclaimer: "सटीक निदान के लिए लाइसेंस प्राप्त डॉक्टर से सलाह लें।",
};

const MARATHI: LanguageTemplate = LanguageTemplate {
    system_prompt: "तुम्ही आरोग्य मार्गदर्शन सहाय्यक आहात। वापरकर्ता लक्षणांचे वर्णन करेल।\n\
उत्तर द्या:\n\
- संभाव्य सामान्य परिस्थिती\n\
- तातडीची पातळी (कमी, मध्यम, उच्च)\n\
- 2-3 कार्यक्षम पुढील पावले\n\
- लहान, स्पष्ट भाषा\n\
नेहमी अस्वीकरण समाविष्ट करा: \"अचूक निदानासाठी परवानाधारक डॉक्टरांचा सल्ला घ्या।\"",
    disclaimer: "अचूक निदानासाठी परवानाधारक डॉक्टरांचा सल्ला घ्या।",
};

pub fn template_for(language: Language) -> &'static LanguageTemplate {
    match language {
        Language::English => &ENGLISH,
        Language::Hindi => &HINDI,
        Language::Marathi => &MARATHI,
    }
}

/// System prompt, a blank line, then the user's text verbatim.
pub fn build_prompt(language: Language, message: &str) -> String {
    format!(
        "{}\n\nSymptoms: {}",
        template_for(language).system_prompt,
        message
    )
}
