/// Write-only display target. Receives the full accumulated text each time,
/// never a delta.
pub trait DisplaySink: Send {
    fn markdown(&mut self, text: &str);
}

impl<F> DisplaySink for F
where
    F: FnMut(&str) + Send,
{
    fn markdown(&mut self, text: &str) {
        self(text)
    }
}
