use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Post bodies are authored in a rich-text editor and rendered as HTML on the
/// public site. Safe formatting tags (<p>, <b>, <ul>, <img>) survive; <script>,
/// <iframe> and event-handler attributes are stripped before storage.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
