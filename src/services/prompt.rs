//! Prompt template for transcript search

const TEMPLATE: &str = r#"You are given the transcript of a video as a JSON array. Each element has
"text" (what is said), "start" (seconds from the beginning of the video) and
"duration" (seconds the line stays on screen).

Transcript:
{transcript}

Find every moment in the video that matches this request:
{query}

Respond with a JSON array of strings. Each string is the "start" value, in
seconds, of a transcript line where a matching moment begins. Order the array
by time and return an empty array if nothing matches."#;

/// Fill the template with a formatted transcript and the user's query
pub fn render(transcript: &str, query: &str) -> String {
    // Substitute the query first so a transcript containing "{query}" is left intact
    TEMPLATE
        .replacen("{query}", query, 1)
        .replacen("{transcript}", transcript, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_both_slots() {
        let prompt = render(r#"[{"text":"hi","start":0.0,"duration":1.0}]"#, "greetings");

        assert!(prompt.contains(r#""text":"hi""#));
        assert!(prompt.contains("greetings"));
        assert!(!prompt.contains("{transcript}"));
        assert!(!prompt.contains("{query}"));
    }

    #[test]
    fn test_query_text_is_not_reinterpreted() {
        let prompt = render("[]", "what about {transcript}?");
        assert!(prompt.contains("what about {transcript}?"));
    }
}
