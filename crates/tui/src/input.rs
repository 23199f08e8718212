#[derive(Debug, Default)]
pub struct InputState {
    pub buffer: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_char(&mut self, c: char) {
        if c == '\n' || c == '\r' {
            return;
        }
        self.buffer.push(c);
    }

    pub fn handle_paste(&mut self, text: &str) {
        for c in text.chars() {
            self.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn take(&mut self) -> String {
        let value = self.buffer.trim().to_string();
        self.buffer.clear();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_drops_line_breaks() {
        let mut input = InputState::new();
        input.handle_paste("http://x/cb?code=1\n");
        assert_eq!(input.buffer, "http://x/cb?code=1");
    }

    #[test]
    fn take_trims_and_clears() {
        let mut input = InputState::new();
        input.handle_paste("  abc ");
        input.handle_backspace();
        assert_eq!(input.take(), "abc");
        assert!(input.buffer.is_empty());
    }
}
