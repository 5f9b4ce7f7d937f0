use chatfusion_core::{project, Align, Body, Origin, TranscriptView};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, InputMode, Screen};

const ASSISTANT_NAME: &str = "ChatFusion";

// Presentational only; not backed by stored conversations.
const SIDEBAR_HISTORY: [&str; 4] = [
    "History of the Roman Empire",
    "Basics of machine learning",
    "Travel recommendations",
    "Recipe for banana bread",
];

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    match app.screen {
        Screen::Login => render_login(app, frame, frame.area()),
        Screen::Chat => render_chat_screen(app, frame, frame.area()),
    }
}

fn render_login(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 48.min(area.width.saturating_sub(4));
    let popup_height = 9;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height.min(area.height));

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Welcome to ChatFusion ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [prompt_area, _, input_area, _, error_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(Paragraph::new("Sign in with a display name:"), prompt_area);

    let field_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        input_window(app.login_input.text(), app.login_input.cursor(), field_width);
    let input = Paragraph::new(format!("> {}", visible_text)).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    frame.set_cursor_position((input_area.x + cursor_x + 2, input_area.y));

    if let Some(error) = &app.login_error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
            error_area,
        );
    }

    frame.render_widget(
        Paragraph::new("Enter: sign in   Esc: quit").style(Style::default().fg(Color::DarkGray)),
        hint_area,
    );
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(if app.show_sidebar { 30 } else { 0 }),
        Constraint::Min(0),
    ])
    .areas(area);

    if app.show_sidebar {
        render_sidebar(frame, sidebar_area);
    }

    let [header_area, chat_area, input_area, disclaimer_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(main_area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);

    let disclaimer = Paragraph::new("ChatFusion may produce inaccurate information.")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(disclaimer, disclaimer_area);

    render_footer(app, frame, footer_area);

    if app.show_profile_menu {
        render_profile_menu(frame, header_area);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" ChatFusion ", Style::default().fg(Color::Cyan).bold()));

    let mut items = vec![
        ListItem::new(Line::from(Span::styled("+ New Chat", Style::default().bold()))),
        ListItem::new(""),
        ListItem::new(Line::from(Span::styled(
            "History",
            Style::default().fg(Color::Gray).add_modifier(Modifier::UNDERLINED),
        ))),
    ];
    items.extend(
        SIDEBAR_HISTORY
            .iter()
            .map(|title| ListItem::new(Span::styled(*title, Style::default().fg(Color::DarkGray)))),
    );

    frame.render_widget(List::new(items).block(block), area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = Line::from(vec![
        Span::styled(" ● Online ", Style::default().fg(Color::Green)),
        Span::styled(
            format!("{} ", app.client.model()),
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray)),
        area,
    );

    let profile = match app.current_user() {
        Some(user) => Line::from(vec![
            Span::styled(format!("[{}] ", user.initial()), Style::default().fg(Color::Magenta).bold()),
            Span::styled(user.display_name.clone(), Style::default().fg(Color::White).bold()),
            Span::raw(" ▾ "),
        ]),
        None => Line::from(" Profile ▾ "),
    };
    frame.render_widget(
        Paragraph::new(profile)
            .alignment(Alignment::Right)
            .style(Style::default().bg(Color::DarkGray)),
        area,
    );
}

fn render_profile_menu(frame: &mut Frame, header_area: Rect) {
    let width = 18.min(header_area.width);
    let menu_area = Rect::new(
        header_area.x + header_area.width.saturating_sub(width),
        header_area.y + 1,
        width,
        3,
    )
    .intersection(frame.area());
    if menu_area.is_empty() {
        return;
    }

    frame.render_widget(Clear, menu_area);
    let menu = Paragraph::new(Line::from(vec![
        Span::styled(" l ", Style::default().fg(Color::Yellow).bold()),
        Span::raw("Logout"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(menu, menu_area);
}

fn transcript_lines(view: &TranscriptView<'_>, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for row in &view.rows {
        let align = match row.align {
            Align::Left => Alignment::Left,
            Align::Right => Alignment::Right,
        };

        let label = match row.origin {
            Origin::User => Span::styled("You", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Origin::Assistant => Span::styled(
                ASSISTANT_NAME,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        };
        lines.push(Line::from(label).alignment(align));

        match &row.body {
            Body::Plain(text) => {
                for line in text.lines() {
                    lines.push(Line::from(Span::raw(line.to_string())).alignment(align));
                }
            }
            Body::Rich { text, attribution, warning } => {
                if *warning {
                    lines.push(
                        Line::from(Span::styled(
                            format!("⚠ {}", text),
                            Style::default().fg(Color::Red),
                        ))
                        .alignment(align),
                    );
                } else {
                    for line in text.lines() {
                        lines.push(parse_markdown_line(line).alignment(align));
                    }
                }

                if let Some(attribution) = attribution {
                    lines.push(Line::default());
                    lines.push(
                        Line::from(vec![
                            Span::styled("Powered by ", Style::default().fg(Color::DarkGray)),
                            Span::styled(
                                format!("◆ {}", attribution.label),
                                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                            ),
                        ])
                        .alignment(align),
                    );
                }
            }
        }
        lines.push(Line::default());
    }

    if view.typing {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("⟳ {} is typing{}", ASSISTANT_NAME, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Split a styled line into words, keeping each piece's style. A word that
/// runs across a span boundary stays one word.
fn styled_words(line: &Line<'_>) -> Vec<Vec<Span<'static>>> {
    let mut words: Vec<Vec<Span<'static>>> = Vec::new();
    let mut open = false;

    for span in &line.spans {
        let content = span.content.as_ref();
        let joins = open && !content.starts_with(char::is_whitespace);

        for (i, word) in content.split_whitespace().enumerate() {
            let piece = Span::styled(word.to_string(), span.style);
            match words.last_mut() {
                Some(last) if i == 0 && joins => last.push(piece),
                _ => words.push(vec![piece]),
            }
        }

        if !content.is_empty() {
            open = !content.ends_with(char::is_whitespace);
        }
    }

    words
}

/// Break a word into chunks of at most `width` columns.
fn split_word(word: Vec<Span<'static>>, width: usize) -> Vec<(Vec<Span<'static>>, usize)> {
    let mut chunks = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_len = 0;

    for span in word {
        let mut text = String::new();
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if current_len > 0 && current_len + w > width {
                if !text.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut text), span.style));
                }
                chunks.push((std::mem::take(&mut current), current_len));
                current_len = 0;
            }
            text.push(c);
            current_len += w;
        }
        if !text.is_empty() {
            current.push(Span::styled(text, span.style));
        }
    }

    if !current.is_empty() {
        chunks.push((current, current_len));
    }
    chunks
}

/// Word-wrap a styled line into rows of at most `width` columns.
///
/// Whitespace runs collapse to one space and words wider than a row are
/// split. The paragraph is drawn without its own wrapping, so the returned
/// row count is exactly what ends up on screen.
fn wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let finish = |spans: Vec<Span<'static>>| {
        let mut row = Line::from(spans).style(line.style);
        row.alignment = line.alignment;
        row
    };

    let mut rows = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_len = 0;

    for word in styled_words(line) {
        let word_len: usize = word.iter().map(Span::width).sum();

        if current_len > 0 && current_len + 1 + word_len <= width {
            // Word fits on current line
            current.push(Span::raw(" "));
            current.extend(word);
            current_len += 1 + word_len;
            continue;
        }

        if current_len > 0 {
            rows.push(finish(std::mem::take(&mut current)));
        }

        let mut chunks = split_word(word, width);
        let last = chunks.pop();
        for (spans, _) in chunks {
            rows.push(finish(spans));
        }
        (current, current_len) = last.unwrap_or_default();
    }

    // Don't forget the last line
    if !current.is_empty() || rows.is_empty() {
        rows.push(finish(current));
    }

    rows
}

/// Visible part of a single-line input and the cursor column within it,
/// scrolled so the cursor cell stays inside `width` columns.
fn input_window(text: &str, cursor: usize, width: usize) -> (String, u16) {
    let cells: Vec<(char, usize)> = text.chars().map(|c| (c, c.width().unwrap_or(0))).collect();
    let cursor = cursor.min(cells.len());
    let cursor_col: usize = cells[..cursor].iter().map(|(_, w)| w).sum();

    let mut start = 0;
    let mut start_col = 0;
    while width > 0 && start < cursor && cursor_col - start_col >= width {
        start_col += cells[start].1;
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for &(c, w) in &cells[start..] {
        if used + w > width {
            break;
        }
        visible.push(c);
        used += w;
    }

    let column = (cursor_col - start_col).min(u16::MAX as usize) as u16;
    (visible, column)
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let Some(session) = app.session.as_ref() else {
        return;
    };
    let entries = session.transcript().snapshot();
    let awaiting = session.is_awaiting();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }));
    let inner = block.inner(area);

    let lines: Vec<Line<'static>> = transcript_lines(&project(entries, awaiting), app.animation_frame)
        .iter()
        .flat_map(|line| wrap_line(line, inner.width as usize))
        .collect();
    let height = lines.len().min(u16::MAX as usize) as u16;
    let max_scroll = height.saturating_sub(inner.height);
    let len = entries.len();

    // Jump to the latest entry whenever the transcript grows or the typing
    // indicator toggles; otherwise keep the user's scroll position.
    app.chat_max_scroll = max_scroll;
    if app.autoscroll.observe(len, awaiting) {
        app.chat_scroll = max_scroll;
    } else {
        app.chat_scroll = app.chat_scroll.min(max_scroll);
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let input = session.input();
    let editing = app.input_mode == InputMode::Editing;

    let title = if session.is_awaiting() {
        " Waiting for reply... "
    } else {
        " Message (Enter to send) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(title);

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(input.text(), input.cursor(), inner_width);

    let paragraph = if input.is_empty() && !editing {
        Paragraph::new("Send a message...").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(paragraph.block(input_block), area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hint = match (&app.notice, app.input_mode) {
        (Some(notice), _) => Span::styled(format!(" {}", notice), Style::default().fg(Color::Yellow)),
        (None, InputMode::Editing) => Span::styled(
            " Enter: send  Esc: normal mode  PgUp/PgDn: scroll  Ctrl+C: quit",
            Style::default().fg(Color::DarkGray),
        ),
        (None, InputMode::Normal) => Span::styled(
            " i: type  j/k: scroll  p: profile  b: sidebar  q: quit",
            Style::default().fg(Color::DarkGray),
        ),
    };

    frame.render_widget(
        Paragraph::new(Line::from(vec![Span::styled(mode_text, mode_style), hint])),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chatfusion_core::{CompletionClient, CompletionError, LocalAuth, MessageEntry};
    use ratatui::{backend::TestBackend, Terminal};

    use crate::app::tests::test_app;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("a **b** c");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(line_text(&line), "a **b");
    }

    #[test]
    fn test_user_text_is_never_styled() {
        let entries = vec![MessageEntry::greeting(), MessageEntry::user("**hi**")];
        let lines = transcript_lines(&project(&entries, false), 0);

        let user_line = lines.iter().find(|l| line_text(l) == "**hi**").unwrap();
        assert_eq!(user_line.alignment, Some(Alignment::Right));
        assert_eq!(user_line.spans.len(), 1);
    }

    #[test]
    fn test_reply_renders_attribution_line() {
        let entries = vec![MessageEntry::reply("Hi there")];
        let lines = transcript_lines(&project(&entries, false), 0);
        let texts: Vec<String> = lines.iter().map(line_text).collect();

        assert!(texts.contains(&"Hi there".to_string()));
        assert!(texts.contains(&"Powered by ◆ ChatFusion".to_string()));
    }

    #[test]
    fn test_typing_indicator_is_last() {
        let entries = vec![MessageEntry::greeting()];
        let lines = transcript_lines(&project(&entries, true), 2);
        assert_eq!(line_text(lines.last().unwrap()), "⟳ ChatFusion is typing...");

        let lines = transcript_lines(&project(&entries, false), 2);
        assert!(!lines.iter().any(|l| line_text(l).contains("typing")));
    }

    fn screen_rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    struct LongReplyClient(String);

    #[async_trait]
    impl CompletionClient for LongReplyClient {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Ok(self.0.clone())
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_wrap_line_breaks_on_words() {
        let rows = wrap_line(&Line::from("aaaa bbbb cccc"), 9);
        let texts: Vec<String> = rows.iter().map(line_text).collect();
        assert_eq!(texts, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_wrap_line_splits_long_words() {
        let rows = wrap_line(&Line::from("abcdefghij"), 4);
        let texts: Vec<String> = rows.iter().map(line_text).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_line_counts_wide_glyphs() {
        let rows = wrap_line(&Line::from("你好世界"), 4);
        let texts: Vec<String> = rows.iter().map(line_text).collect();
        assert_eq!(texts, vec!["你好", "世界"]);
    }

    #[test]
    fn test_wrap_line_keeps_style_and_alignment() {
        let line = parse_markdown_line("a **bold** b").alignment(Alignment::Right);
        let rows = wrap_line(&line, 6);

        assert_eq!(rows.len(), 2);
        assert_eq!(line_text(&rows[0]), "a bold");
        assert_eq!(line_text(&rows[1]), "b");
        assert!(rows.iter().all(|r| r.alignment == Some(Alignment::Right)));

        let bold = rows[0].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_wrap_line_empty_is_one_row() {
        assert_eq!(wrap_line(&Line::default(), 10).len(), 1);
    }

    #[test]
    fn test_input_window_ascii() {
        assert_eq!(input_window("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(input_window("abcdefghij", 10, 4), ("hij".to_string(), 3));
    }

    #[test]
    fn test_input_window_uses_display_width() {
        assert_eq!(input_window("👋你好", 3, 20), ("👋你好".to_string(), 6));
        assert_eq!(input_window("你好世界", 4, 5), ("世界".to_string(), 4));
        assert_eq!(input_window("你好世界", 1, 5), ("你好".to_string(), 2));
    }

    #[tokio::test]
    async fn test_long_reply_tail_is_visible() {
        let mut words: Vec<String> = ('a'..='v').map(|c| c.to_string().repeat(8)).collect();
        words.push("LASTWORD".to_string());
        let mut app = App::with_parts(
            Box::new(LocalAuth::default()),
            Arc::new(LongReplyClient(words.join(" "))),
            Some("ada".to_string()),
        );
        app.sign_in();
        app.show_sidebar = false;

        {
            let session = app.session.as_mut().unwrap();
            session.submit("hi");
            session.next_resolution().await;
        }

        let mut terminal = Terminal::new(TestBackend::new(16, 14)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(app.chat_scroll, app.chat_max_scroll);

        let screen = screen_rows(&terminal).join("\n");
        assert!(screen.contains("LASTWORD"), "{screen}");
        assert!(screen.contains("Powered by"), "{screen}");
        assert!(!screen.contains("aaaaaaaa"), "{screen}");

        // Scrolling further down has nothing more to show.
        app.scroll_down(100);
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(app.chat_scroll, app.chat_max_scroll);
    }

    #[test]
    fn test_profile_menu_on_short_terminal() {
        let mut app = test_app();
        app.sign_in();
        app.show_profile_menu = true;

        for height in 1..=4 {
            let mut terminal = Terminal::new(TestBackend::new(40, height)).unwrap();
            terminal.draw(|f| render(&mut app, f)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_render_scrolls_to_latest() {
        let mut app = test_app();
        app.sign_in();

        let backend = TestBackend::new(60, 14);
        let mut terminal = Terminal::new(backend).unwrap();

        {
            let session = app.session.as_mut().unwrap();
            for i in 0..6 {
                session.submit(&format!("message number {}", i));
                session.next_resolution().await;
            }
        }
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(app.chat_max_scroll > 0);
        assert_eq!(app.chat_scroll, app.chat_max_scroll);

        // Manual scroll survives redraws until the transcript changes.
        app.scroll_up(2);
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(app.chat_scroll, app.chat_max_scroll - 2);

        app.session.as_mut().unwrap().submit("one more");
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(app.chat_scroll, app.chat_max_scroll);
    }
}
