/// One classified line of external input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Words spoken to the agent
    Speech(String),
    /// Something done to the agent, written `*like this*`
    Action(String),
    /// A change in the surroundings, written `~like this`
    Environment(String),
}

impl InputEvent {
    pub fn text(&self) -> &str {
        match self {
            InputEvent::Speech(s) | InputEvent::Action(s) | InputEvent::Environment(s) => s,
        }
    }
}

/// Classify a raw input line. Blank lines yield `None`.
pub fn classify_input(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.len() > 2 && line.starts_with('*') && line.ends_with('*') {
        let inner = line[1..line.len() - 1].trim();
        if !inner.is_empty() {
            return Some(InputEvent::Action(inner.to_string()));
        }
    }
    if let Some(rest) = line.strip_prefix('~') {
        let rest = rest.trim();
        return (!rest.is_empty()).then(|| InputEvent::Environment(rest.to_string()));
    }
    Some(InputEvent::Speech(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kinds() {
        assert_eq!(
            classify_input("*wraps you in a blanket*"),
            Some(InputEvent::Action("wraps you in a blanket".into()))
        );
        assert_eq!(
            classify_input("~ the wind picks up"),
            Some(InputEvent::Environment("the wind picks up".into()))
        );
        assert_eq!(
            classify_input("  are you okay?  "),
            Some(InputEvent::Speech("are you okay?".into()))
        );
    }

    #[test]
    fn test_degenerate_lines() {
        assert_eq!(classify_input(""), None);
        assert_eq!(classify_input("   "), None);
        assert_eq!(classify_input("~"), None);
        // too short to be an action
        assert_eq!(classify_input("**"), Some(InputEvent::Speech("**".into())));
        assert_eq!(classify_input("* *"), Some(InputEvent::Speech("* *".into())));
    }
}
