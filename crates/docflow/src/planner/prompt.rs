use crate::document::{Action, Presence, PIPELINE};

/// Describes a document's progress to the decision oracle and asks for one
/// action token.
pub fn status_prompt(presence: Presence) -> String {
    let workflow = PIPELINE
        .iter()
        .map(|a| a.token())
        .collect::<Vec<_>>()
        .join(" -> ");

    let mut prompt = String::from(
        "Analyze the document processing status and return ONLY the action name.\n\n",
    );
    prompt.push_str("Document Status:\n");
    prompt.push_str(&format!("- Text extracted: {}\n", presence.text));
    prompt.push_str(&format!("- Summary: {}\n", presence.summary));
    prompt.push_str(&format!("- Audio (TTS): {}\n", presence.audio));
    prompt.push_str(&format!("- Image: {}\n\n", presence.image));
    prompt.push_str(&format!("Required workflow: {}\n\n", workflow));
    prompt.push_str("Return ONLY one word from this list:\n");
    for action in Action::ALL {
        prompt.push_str(&format!("- \"{}\" ({})\n", action.token(), hint(action)));
    }
    prompt.push_str("\nReturn only the word, nothing else.");
    prompt
}

fn hint(action: Action) -> &'static str {
    match action {
        Action::ExtractText => "if text is missing",
        Action::Summarize => "if summary is missing",
        Action::Tts => "if audio is missing",
        Action::GenerateImage => "if image is missing",
        Action::Complete => "if all steps are done",
    }
}
