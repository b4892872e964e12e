use rand::seq::SliceRandom;

const THINKING_MESSAGES: &[&str] = &[
    "Thinking",
    "Pondering",
    "Mulling it over",
    "Considering",
    "Reading between the lines",
    "Choosing words",
    "Gathering thoughts",
    "Connecting the dots",
    "Weighing options",
    "Consulting the notes",
    "Sketching an answer",
    "Turning it over",
];

/// Spinner label shown while the model or the tools are working
pub fn get_random_thinking_message() -> &'static str {
    THINKING_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Thinking")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_comes_from_the_list() {
        for _ in 0..20 {
            assert!(THINKING_MESSAGES.contains(&get_random_thinking_message()));
        }
    }
}
