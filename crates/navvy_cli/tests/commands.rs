use navvy_cli::commands::{parse_slash_command, SlashCommand};
use pretty_assertions::assert_eq;

#[test]
fn plain_text_is_not_a_command() {
    assert_eq!(parse_slash_command("add a readme"), None);
    assert_eq!(parse_slash_command("   "), None);
}

#[test]
fn known_commands_parse() {
    assert_eq!(parse_slash_command("/help"), Some(SlashCommand::Help));
    assert_eq!(parse_slash_command("/history"), Some(SlashCommand::History));
    assert_eq!(parse_slash_command(" /clear "), Some(SlashCommand::Clear));
    assert_eq!(parse_slash_command("/commits"), Some(SlashCommand::Commits));
    assert_eq!(parse_slash_command("/quit"), Some(SlashCommand::Quit));
    assert_eq!(parse_slash_command("/exit"), Some(SlashCommand::Quit));
}

#[test]
fn undo_takes_an_optional_commit() {
    assert_eq!(parse_slash_command("/undo"), Some(SlashCommand::Undo(None)));
    assert_eq!(
        parse_slash_command("/undo 1a2b3c"),
        Some(SlashCommand::Undo(Some("1a2b3c".to_string())))
    );
}

#[test]
fn unknown_commands_keep_their_name() {
    assert_eq!(
        parse_slash_command("/rewind 3"),
        Some(SlashCommand::Unknown("/rewind".to_string()))
    );
}
