use std::{fmt, fs, io, path::Path, rc::Rc};

/// The full text of a program being interpreted, plus a label for
/// where it came from. Kept alive for the lifetime of a run so that
/// [`Spanned`](crate::common::span::Spanned) positions always remain
/// valid to report against.
pub struct Source {
    pub path: String,
    pub contents: String,
}

impl Source {
    /// Reads a source file fully into memory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Rc<Source>> {
        let contents = fs::read_to_string(path.as_ref())?;
        Ok(Rc::new(Source {
            path: path.as_ref().display().to_string(),
            contents,
        }))
    }

    /// Builds an in-memory source, useful for tests and embedding.
    pub fn in_memory(contents: impl Into<String>) -> Rc<Source> {
        Rc::new(Source {
            path: "<memory>".to_string(),
            contents: contents.into(),
        })
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({})", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_roundtrip() {
        let source = Source::in_memory("print 1;");
        assert_eq!(source.contents, "print 1;");
        assert_eq!(source.path, "<memory>");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(Source::from_path("/does/not/exist.midas").is_err());
    }
}
