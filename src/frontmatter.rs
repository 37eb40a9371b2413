//! Leading YAML frontmatter on workspace markdown files.
//!
//! A document may open with a `---` line, a YAML mapping, and a closing
//! `---` line. Anything that fails to parse is treated as "no metadata":
//! callers fall back to file-name based behavior instead of failing.

use serde_json::{Map, Value};

/// A markdown document split into its frontmatter mapping and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub data: Map<String, Value>,
    pub body: String,
}

impl Document {
    /// Split `content` into frontmatter and body.
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let Some((yaml, body)) = split_frontmatter(content) else {
            return Document {
                data: Map::new(),
                body: content.to_string(),
            };
        };

        let data = match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(_) => {
                log::debug!("Frontmatter is not a mapping; ignoring");
                Map::new()
            }
            Err(e) => {
                log::debug!("Malformed frontmatter ignored: {}", e);
                Map::new()
            }
        };

        Document {
            data,
            body: body.to_string(),
        }
    }

    /// Scalar field as a trimmed string. Numbers and booleans are stringified.
    pub fn get_str(&self, key: &str) -> Option<String> {
        scalar_string(self.data.get(key)?)
    }

    /// Field that may be either a list or a comma-separated string.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.data.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            Some(other) => scalar_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Raw text of a field for substring checks: lists are joined with ", ".
    pub fn get_joined(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            Value::Array(_) => {
                let items = self.get_list(key);
                if items.is_empty() {
                    None
                } else {
                    Some(items.join(", "))
                }
            }
            other => scalar_string(other),
        }
    }

    /// Text of the first `# ` heading in the body.
    pub fn first_h1(&self) -> Option<String> {
        self.body.lines().find_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("# ")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Returns `(yaml, body)` when `content` opens with a closed `---` block.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}
