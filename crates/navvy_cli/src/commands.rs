#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    History,
    Clear,
    Commits,
    Undo(Option<String>),
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str =
    "Commands: /help, /history, /clear, /commits, /undo [commit], /quit";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let command = words.next().unwrap_or(trimmed).to_string();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/history" => SlashCommand::History,
        "/clear" => SlashCommand::Clear,
        "/commits" => SlashCommand::Commits,
        "/undo" => SlashCommand::Undo(words.next().map(str::to_string)),
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}
