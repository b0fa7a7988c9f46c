/// Splits text into records on `\n` or `\r\n`. A lone `\r` is record content.
///
/// Terminators are not part of the record and a trailing terminator does not yield an empty
/// final record.
pub fn split_records(text: &str) -> Records<'_> {
    Records { rest: text }
}

#[derive(Debug, Clone)]
pub struct Records<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.find('\n') {
            Some(idx) => {
                let line = &self.rest[..idx];
                self.rest = &self.rest[idx + 1..];
                Some(line.strip_suffix('\r').unwrap_or(line))
            }
            None => {
                let record = self.rest;
                self.rest = "";
                Some(record)
            }
        }
    }
}
