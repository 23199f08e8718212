use super::*;
use crate::callback::CallbackStatus;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

impl App {
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        match self.route {
            Route::AuthCallback => self.render_callback(frame, area),
            Route::Login => self.render_login(frame, area),
            Route::Onboarding => self.render_placeholder(
                frame,
                area,
                " Onboarding ",
                "Welcome! Set up your first goals in the web app.\n\n[s] sign out  [Esc] quit",
            ),
            Route::Dashboard => self.render_placeholder(
                frame,
                area,
                " Dashboard ",
                "You're all set.\n\n[s] sign out  [Esc] quit",
            ),
        }
    }

    fn render_callback(&self, frame: &mut Frame, area: Rect) {
        // An already-onboarded user gets an empty frame until the shell moves on.
        let Some(status) = self.callback.as_ref().and_then(|c| c.phase().status()) else {
            return;
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                state_label(&status),
                Style::default()
                    .fg(state_color(&status))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(status.message.clone()),
        ];

        if let Some(trace) = &status.trace {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Debug",
                Style::default().add_modifier(Modifier::UNDERLINED),
            )));
            for (key, value) in trace.iter() {
                lines.push(Line::from(vec![
                    Span::styled(format!("{key:>8}: "), Style::default().fg(Color::DarkGray)),
                    Span::raw(value.to_string()),
                ]));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" swayami "))
            .wrap(Wrap { trim: false })
            .centered();
        frame.render_widget(paragraph, area);
    }

    fn render_login(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(""), Line::from("Sign in to swayami"), Line::from("")];

        match &self.authorize_url {
            Some(url) => {
                lines.push(Line::from("1. Open this link in your browser:"));
                lines.push(Line::from(Span::styled(
                    url.clone(),
                    Style::default().fg(Color::Cyan),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from("2. Paste the URL you were redirected to and press Enter:"));
            }
            None => lines.push(Line::from("Paste a callback URL and press Enter:")),
        }
        lines.push(Line::from(format!("> {}", self.input.buffer)));

        if let Some(error) = &self.last_error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Login "))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_placeholder(&self, frame: &mut Frame, area: Rect, title: &str, body: &str) {
        let name = self
            .known_user
            .as_ref()
            .map(|u| u.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "there".to_string());
        let text = format!("\n\n  Hi {name}.\n\n  {body}\n");
        let paragraph =
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(paragraph, area);
    }
}

fn state_label(status: &CallbackStatus) -> &'static str {
    match status.state {
        CallbackState::Loading => "Signing you in",
        CallbackState::Success => "Signed in",
        CallbackState::Error => "Sign-in failed",
    }
}

fn state_color(status: &CallbackStatus) -> Color {
    match status.state {
        CallbackState::Loading => Color::Yellow,
        CallbackState::Success => Color::Green,
        CallbackState::Error => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).expect("terminal");
        terminal.draw(|frame| app.render(frame)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn login_screen_shows_paste_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = App::new(Config::default(), TokenStore::at(dir.path()));
        app.input.handle_paste("http://localhost");

        let text = screen_text(&mut app);
        assert!(text.contains("Paste a callback URL"));
        assert!(text.contains("> http://localhost"));
    }

    #[tokio::test]
    async fn callback_screen_shows_loading_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = App::new(Config::default(), TokenStore::at(dir.path()));
        app.open_callback_url("http://localhost:5173/auth/callback")
            .expect("valid url");

        let text = screen_text(&mut app);
        assert!(text.contains("Signing you in"));
    }
}
