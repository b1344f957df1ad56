//! Prompts sent to language models
//!
//! The OCR prompt is handed to the memory store, which runs its own
//! extraction pass over captured screen text. The interest prompt is sent
//! to the generation endpoint by the interest summarizer.

/// Extraction instructions attached to OCR captures
pub const OCR_EXTRACTION_PROMPT: &str = r#"You are given raw OCR text captured from the user's screen.

1. CLEAN
   - Normalize whitespace and punctuation and drop OCR artifacts such as broken ligatures or runs of repeated symbols.
   - Rejoin words split across lines and fix common character confusions (1/l, 0/O, rn/m).
   - Discard window chrome: title bars, toolbar labels, clock or battery readouts, and any line shorter than 3 characters.

2. EXTRACT
   Keep only information that gives context about the user or asks them to act. Tag each item as one of:
   - Task: something to do, usually built around a verb ("send", "finish", "call").
   - Event: a meeting, appointment or other date/time reference.
   - Decision: a choice or conclusion that has been settled.
   - Note: a fact likely to matter later (numbers, identifiers, contact details).
   - Link: any URL.

3. OUTPUT
   Return a short bulleted list with one item per line, written as "- <Tag>: <cleaned content>".
   Keep original capitalization only for proper nouns and acronyms. If nothing is worth keeping, return an empty list."#;

/// Opening of the interest summary prompt; memories follow as `- {memory}` lines
pub const INTEREST_PROMPT_HEADER: &str = "Analyze the following user memories and identify the user's main interests.
Write a concise narrative summary of these interests, then list the most frequent topics or themes with each topic's name and how often it appears.

Memories:
";

/// Closing of the interest summary prompt
pub const INTEREST_PROMPT_FOOTER: &str = r#"
Respond with JSON only, using this structure:
{ "summary": "<narrative summary>", "topics": [ { "name": "<topic>", "count": <count> } ] }
"#;
