// Supported languages, instruction templates and translation domains
// Author: kelexine (https://github.com/kelexine)

use phf::{phf_map, phf_ordered_map};
use serde::{Serialize, Serializer};

/// Language code → display name. Fixed for the process lifetime.
pub static SUPPORTED_LANGUAGES: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "en" => "English",
    "ur" => "Urdu",
    "hi" => "Hindi",
    "ar" => "Arabic",
    "bn" => "Bengali",
    "ta" => "Tamil",
    "te" => "Telugu",
    "mr" => "Marathi",
    "gu" => "Gujarati",
    "pa" => "Punjabi",
};

/// Script-aware instructions for the languages that have one.
static LANGUAGE_INSTRUCTIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "ur" => "Translate the following English text to Urdu. Use proper Urdu script (Nastaliq style). Maintain technical terms where appropriate. Keep the meaning and context intact.",
    "hi" => "Translate the following English text to Hindi. Use Devanagari script. Maintain technical terms where appropriate.",
    "ar" => "Translate the following English text to Arabic. Use proper Arabic script. Maintain technical terms where appropriate.",
    "bn" => "Translate the following English text to Bengali. Use Bengali script. Maintain technical terms where appropriate.",
    "ta" => "Translate the following English text to Tamil. Use Tamil script. Maintain technical terms where appropriate.",
    "te" => "Translate the following English text to Telugu. Use Telugu script. Maintain technical terms where appropriate.",
    "mr" => "Translate the following English text to Marathi. Use Devanagari script. Maintain technical terms where appropriate.",
    "gu" => "Translate the following English text to Gujarati. Use Gujarati script. Maintain technical terms where appropriate.",
    "pa" => "Translate the following English text to Punjabi. Use Gurmukhi script. Maintain technical terms where appropriate.",
};

/// System instruction used for context-augmented translation.
pub const CONTEXT_TRANSLATOR_INSTRUCTION: &str = "You are an expert translator specializing in technical and educational content. Always consider the provided context for accurate translation.";

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains_key(code)
}

/// Display name for a code, or the code itself when it is not in the table.
pub fn display_name(code: &str) -> &str {
    SUPPORTED_LANGUAGES.get(code).copied().unwrap_or(code)
}

/// Comma separated list of supported codes, in table order.
pub fn supported_codes() -> String {
    SUPPORTED_LANGUAGES
        .keys()
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// System instruction for a plain translation into `code`.
pub fn language_instruction(code: &str) -> String {
    match LANGUAGE_INSTRUCTIONS.get(code) {
        Some(instruction) => instruction.to_string(),
        None => format!("Translate the following text to {}.", display_name(code)),
    }
}

/// User payload shared by the plain and domain translation paths.
pub fn translation_payload(text: &str) -> String {
    format!("Text to translate:\n\n{}", text)
}

/// User payload for context-augmented translation.
pub fn context_payload(text: &str, target_lang: &str, context: &str) -> String {
    format!(
        "Context: {context}\n\n\
         Translate the following English text to {name}.\n\
         Use the provided context to ensure accurate translation of technical terms and concepts.\n\
         Maintain the original formatting and structure.\n\n\
         Text to translate:\n\n{text}",
        name = display_name(target_lang),
    )
}

/// Ordered view of the language table, serialized as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageTable;

impl Serialize for LanguageTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(SUPPORTED_LANGUAGES.entries())
    }
}

/// Topic of a domain-specialized translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Robotics,
    Ai,
    Programming,
    General,
}

impl Domain {
    /// Parse a domain tag. Unknown tags fall back to `General`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "robotics" => Domain::Robotics,
            "ai" => Domain::Ai,
            "programming" => Domain::Programming,
            _ => Domain::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Robotics => "robotics",
            Domain::Ai => "ai",
            Domain::Programming => "programming",
            Domain::General => "general",
        }
    }

    /// System instruction for this domain, phrased for the target language.
    pub fn instruction(&self, target_lang: &str) -> String {
        let language = display_name(target_lang);
        match self {
            Domain::Robotics => format!(
                "Translate this robotics/technical content to {language}. Keep technical terms like 'ROS', 'URDF', 'SLAM' in English if they don't have common {language} equivalents. Use proper {language} technical terminology where available."
            ),
            Domain::Ai => format!(
                "Translate this AI/machine learning content to {language}. Keep technical terms like 'neural networks', 'algorithms', 'models' in English if they don't have common {language} equivalents. Use proper {language} technical terminology where available."
            ),
            Domain::Programming => format!(
                "Translate this programming content to {language}. Keep code snippets, function names, and programming keywords in English. Translate comments and explanations to {language}."
            ),
            Domain::General => format!(
                "Translate this general educational content to {language}, maintaining clarity and educational value."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_table() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 10);
        assert!(is_supported("ur"));
        assert!(is_supported("pa"));
        assert!(!is_supported("fr"));
        assert!(!is_supported("UR"));
        assert_eq!(supported_codes(), "en, ur, hi, ar, bn, ta, te, mr, gu, pa");
    }

    #[test]
    fn test_instruction_fallback() {
        assert!(language_instruction("ur").contains("Nastaliq"));
        // English has no specialized template
        assert_eq!(
            language_instruction("en"),
            "Translate the following text to English."
        );
        assert_eq!(display_name("xx"), "xx");
    }

    #[test]
    fn test_table_serializes_in_order() {
        let json = serde_json::to_string(&LanguageTable).unwrap();
        assert!(json.starts_with(r#"{"en":"English","ur":"Urdu""#));
        assert!(json.ends_with(r#""pa":"Punjabi"}"#));
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!(Domain::parse("robotics"), Domain::Robotics);
        assert_eq!(Domain::parse("AI"), Domain::Ai);
        assert_eq!(Domain::parse("programming"), Domain::Programming);
        assert_eq!(Domain::parse("cooking"), Domain::General);
        assert_eq!(Domain::parse(""), Domain::General);
    }

    #[test]
    fn test_domain_instruction_names_target() {
        let instruction = Domain::Robotics.instruction("hi");
        assert!(instruction.contains("Hindi"));
        assert!(instruction.contains("SLAM"));
    }

    #[test]
    fn test_context_payload() {
        let payload = context_payload("Joint torque", "ur", "Chapter on actuators");
        assert!(payload.starts_with("Context: Chapter on actuators"));
        assert!(payload.contains("to Urdu."));
        assert!(payload.ends_with("Text to translate:\n\nJoint torque"));
    }
}
