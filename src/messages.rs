//! Fixed user-facing sentences.
//!
//! These strings are part of the external contract: they are returned to the
//! caller and written to the conversation log verbatim.

/// Answer for blank or whitespace-only input.
pub const INVALID_INPUT: &str = "Please enter a valid input.";

/// Opaque answer for any unexpected failure in the pipeline.
pub const PROBLEM_OCCURRED: &str =
    "Something went wrong while processing your request. Please try again in a moment.";

/// Answer when the input carries personal data.
pub const GUARD_PII: &str = "I cannot process your personal data like email/phone/date of birth/password for privacy and security reasons";

/// Out-of-domain sentence baked into the instructions template.
pub const CANNOT_PROCESS: &str = "Sorry, I am a chatbot assistant to answer questions related to EduTrack and I cannot process any other query. Please ask questions related to EduTrack";

/// Returned when the corpus path holds no readable documents.
pub const FILE_NOT_FOUND: &str = "No txt file(s) found in the provided path";
