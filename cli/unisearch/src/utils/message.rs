use std::fmt::Display;

/// Write a message to stderr.
///
/// Results go to stdout, everything addressed to the user goes through here.
fn print_message(v: impl Display) {
    #[cfg(test)]
    {
        let history = crate::utils::message::history::History::global();
        history.push_message(format!("{v}"));
    }

    eprintln!("{v}");
}

/// alias for [print_message]
pub(crate) fn plain(v: impl Display) {
    print_message(v);
}
pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("❌ ERROR: {v}"));
}
pub(crate) fn created(v: impl Display) {
    print_message(std::format_args!("✨ {v}"));
}
/// double width character, add an additional space for alignment
pub(crate) fn deleted(v: impl Display) {
    print_message(std::format_args!("🗑️  {v}"));
}
pub(crate) fn updated(v: impl Display) {
    print_message(std::format_args!("✅ {v}"));
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_recorded() {
        let history = history::History::global();
        history.take();

        error("boom");
        updated("saved");

        assert_eq!(history.take(), vec![
            "❌ ERROR: boom".to_string(),
            "✅ saved".to_string()
        ]);
    }
}
