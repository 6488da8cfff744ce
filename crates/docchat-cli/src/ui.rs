//! Interactive prompts and output formatting

use std::io::{self, Write};

use colored::*;

const RESPONSE_MARKER_WIDTH: usize = 60;

/// Display the startup banner.
pub fn display_banner() {
    println!();
    println!("{}", "docchat — ask questions about your documents".blue().bold());
    println!(
        "{}",
        "💡 Answers are grounded in the indexed local document set".dimmed()
    );
    println!();
}

/// Ask a yes/no question; anything other than "y" is a no.
pub fn prompt_confirm(question: &str) -> io::Result<bool> {
    print!("{} {} [y/N]: ", "❓".cyan(), question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_affirmative(&input))
}

/// Read one line of query text from standard input (interactive or piped).
pub fn read_query() -> io::Result<String> {
    print!("{} Enter your question: ", "🤖".blue());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Print the agent's answer wrapped in marker lines.
pub fn print_response(answer: &str) {
    let marker = "─".repeat(RESPONSE_MARKER_WIDTH);
    println!();
    println!("{}", marker.blue());
    println!("{}", answer);
    println!("{}", marker.blue());
}

pub fn is_affirmative(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_y_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" Y \n"));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
    }
}
