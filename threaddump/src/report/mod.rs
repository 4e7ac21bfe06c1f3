//! Thread report
//!
//! A [`Report`] is one [`ThreadSection`] per runtime thread, in the runtime's
//! thread order. Rendered, a section looks like:
//!
//! ```text
//! ManagedThreadId: 1, Name: Main, OSThreadId: 4242, Thread: IsAlive: true, State: Background
//! Thread has an exception: System.InvalidOperationException: boom
//! 1:	App.Worker.Run() at /src/App/Worker.cs:42
//! 2:	[internal]
//! 3:	App.Program.Main(System.String[])
//!
//! ```

pub mod assembler;

pub use assembler::ReportAssembler;

use crate::domain::{ExceptionInfo, ManagedThreadId, OsThreadId, ThreadState};
use crate::symbolization::SymbolicatedFrame;
use std::fmt;
use std::io::{self, Write};

/// Header line data of a thread section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHeader {
    pub managed_thread_id: ManagedThreadId,
    pub name: String,
    pub os_thread_id: OsThreadId,
    pub is_alive: bool,
    pub state: ThreadState,
}

impl fmt::Display for ThreadHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ManagedThreadId: {}, Name: {}, OSThreadId: {}, Thread: IsAlive: {}, State: {}",
            self.managed_thread_id, self.name, self.os_thread_id, self.is_alive, self.state
        )
    }
}

/// Everything printed for one thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSection {
    pub header: ThreadHeader,
    pub exception: Option<ExceptionInfo>,
    /// Stack-walk order
    pub frames: Vec<SymbolicatedFrame>,
}

impl fmt::Display for ThreadSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        if let Some(ref exception) = self.exception {
            writeln!(f, "Thread has an exception: {}: {}", exception.type_name, exception.message)?;
        }
        for (idx, frame) in self.frames.iter().enumerate() {
            writeln!(f, "{}:\t{frame}", idx + 1)?;
        }
        writeln!(f)
    }
}

/// The finished report; immutable once assembled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    sections: Vec<ThreadSection>,
}

impl Report {
    fn push(&mut self, section: ThreadSection) {
        self.sections.push(section);
    }

    #[must_use]
    pub fn sections(&self) -> &[ThreadSection] {
        &self.sections
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of frames over all threads
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.sections.iter().map(|s| s.frames.len()).sum()
    }

    /// Write the rendered report to `writer`
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{self}")?;
        writer.flush()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SourceLocation, ThreadStateFlag};

    fn section(exception: Option<ExceptionInfo>) -> ThreadSection {
        ThreadSection {
            header: ThreadHeader {
                managed_thread_id: ManagedThreadId(1),
                name: "Main".to_string(),
                os_thread_id: OsThreadId(4242),
                is_alive: true,
                state: ThreadState(vec![ThreadStateFlag::Background]),
            },
            exception,
            frames: vec![
                SymbolicatedFrame::Method {
                    method: "App.Worker.Run()".to_string(),
                    location: Some(SourceLocation { file: "Worker.cs".to_string(), line: 42 }),
                },
                SymbolicatedFrame::Internal,
            ],
        }
    }

    #[test]
    fn test_section_format() {
        let text = section(None).to_string();
        assert_eq!(
            text,
            "ManagedThreadId: 1, Name: Main, OSThreadId: 4242, Thread: IsAlive: true, State: Background\n\
             1:\tApp.Worker.Run() at Worker.cs:42\n\
             2:\t[internal]\n\
             \n"
        );
    }

    #[test]
    fn test_exception_line() {
        let exception = ExceptionInfo {
            type_name: "System.InvalidOperationException".to_string(),
            message: "boom".to_string(),
        };
        let text = section(Some(exception)).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "Thread has an exception: System.InvalidOperationException: boom");
        assert_eq!(lines[2], "1:\tApp.Worker.Run() at Worker.cs:42");
    }

    #[test]
    fn test_report_write_to() {
        let mut report = Report::default();
        report.push(section(None));
        report.push(section(None));

        let mut buffer = Vec::new();
        report.write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text, report.to_string());
        assert_eq!(text.matches("ManagedThreadId: 1,").count(), 2);
        assert_eq!(report.thread_count(), 2);
        assert_eq!(report.frame_count(), 4);
    }
}
