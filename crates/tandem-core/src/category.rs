use serde::Deserialize;
use serde::Serialize;

/// Ordered keyword rules for inferring a schedule category from entry text.
/// First match wins; precedence is the rule order in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub rules: Vec<CategoryRule>,
    #[serde(default = "default_category")]
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

fn default_category() -> String {
    "default".to_string()
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        let rules = [
            ("health", &["pt", "운동", "헬스", "병원", "gym", "workout"][..]),
            ("work", &["미팅", "회의", "업무", "보고", "출장", "meeting"][..]),
            ("shift", &["대근", "근무", "당직", "shift"][..]),
            ("development", &["공부", "강의", "독서", "개발", "study"][..]),
            ("finance", &["자산", "은행", "주식", "적금", "bank"][..]),
        ];
        Self {
            rules: rules
                .into_iter()
                .map(|(category, keywords)| CategoryRule {
                    category: category.to_string(),
                    keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                })
                .collect(),
            fallback: default_category(),
        }
    }
}

impl CategoryPolicy {
    /// Loads a user-supplied rule document, e.g.:
    ///
    /// ```yaml
    /// rules:
    ///   - category: health
    ///     keywords: [pt, gym]
    /// fallback: default
    /// ```
    pub fn from_yaml(document: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(document)
    }

    /// First rule whose keyword appears in the lowercased text wins.
    pub fn infer<'a>(&'a self, text: &str) -> &'a str {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| haystack.contains(keyword.as_str())))
            .map(|rule| rule.category.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}
