use std::fmt;

/// The first line where a stored contract and a freshly generated one disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDifference {
    pub line: usize,
    pub old_context: Option<String>,
    pub new_context: Option<String>,
}

impl ContractDifference {
    /// Compares two documents line by line, ignoring trailing whitespace.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        let mut old_lines = old.lines();
        let mut new_lines = new.lines();
        let mut line = 0;

        loop {
            line += 1;
            let (old_line, new_line) = (old_lines.next(), new_lines.next());

            match (old_line, new_line) {
                (None, None) => return None,
                (Some(old_line), Some(new_line)) if old_line.trim_end() == new_line.trim_end() => {}
                _ => {
                    return Some(Self {
                        line,
                        old_context: old_line.map(|l| l.trim().to_string()),
                        new_context: new_line.map(|l| l.trim().to_string()),
                    })
                }
            }
        }
    }
}

impl fmt::Display for ContractDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |context: &Option<String>| match context {
            Some(context) => format!("\"{}\"", context.escape_default()),
            None => "<end of file>".into(),
        };

        write!(
            f,
            "documents differ at line {}. Old: {}. New: {}",
            self.line,
            describe(&self.old_context),
            describe(&self.new_context)
        )
    }
}
