use super::*;

impl App {
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Paste(text) => {
                if self.route == Route::Login {
                    self.input.handle_paste(&text);
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        if key.code == KeyCode::Esc {
            return Ok(true);
        }

        match self.route {
            Route::Login => match key.code {
                KeyCode::Enter => self.submit_input(),
                KeyCode::Backspace => self.input.handle_backspace(),
                KeyCode::Char(c) => self.input.handle_char(c),
                _ => {}
            },
            Route::Onboarding | Route::Dashboard => {
                if key.code == KeyCode::Char('s') {
                    self.sign_out();
                }
            }
            Route::AuthCallback => {}
        }

        Ok(false)
    }

    pub(super) fn submit_input(&mut self) {
        let raw = self.input.take();
        if raw.is_empty() {
            return;
        }
        if let Err(e) = self.open_callback_url(&raw) {
            self.report_error("Invalid callback URL", e);
        }
    }
}
