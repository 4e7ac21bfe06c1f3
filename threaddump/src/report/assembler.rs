//! Builds the report from a snapshot's threads

use log::debug;

use super::{Report, ThreadHeader, ThreadSection};
use crate::domain::RuntimeThread;
use crate::symbolization::FrameSymbolicator;
use crate::thread_names::ThreadNameIndex;

/// Combines thread records, recovered names and symbolicated frames
pub struct ReportAssembler<'a> {
    names: &'a ThreadNameIndex,
    symbolicator: &'a FrameSymbolicator,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(names: &'a ThreadNameIndex, symbolicator: &'a FrameSymbolicator) -> Self {
        Self { names, symbolicator }
    }

    /// One section per thread, in iteration order
    pub fn assemble<'t>(&self, threads: impl IntoIterator<Item = &'t RuntimeThread>) -> Report {
        let mut report = Report::default();
        for thread in threads {
            report.push(self.thread_section(thread));
        }
        debug!("Assembled report: {} threads, {} frames", report.thread_count(), report.frame_count());
        report
    }

    /// Section for a single thread; every frame is kept
    pub fn thread_section(&self, thread: &RuntimeThread) -> ThreadSection {
        let header = ThreadHeader {
            managed_thread_id: thread.managed_thread_id,
            name: self.names.display_name(thread.managed_thread_id).to_string(),
            os_thread_id: thread.os_thread_id,
            is_alive: thread.is_alive,
            state: thread.state.clone(),
        };

        let frames = thread.frames.iter().map(|frame| self.symbolicator.symbolicate(frame)).collect();

        ThreadSection { header, exception: thread.current_exception.clone(), frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ExceptionInfo, ManagedThreadId, MethodInfo, MethodToken, OsThreadId, StackFrame,
        ThreadState,
    };
    use crate::symbolization::SymbolicatedFrame;

    fn thread(id: i32, frames: Vec<StackFrame>) -> RuntimeThread {
        RuntimeThread {
            managed_thread_id: ManagedThreadId(id),
            os_thread_id: OsThreadId(100 + id as u32),
            is_alive: true,
            state: ThreadState::default(),
            current_exception: None,
            frames,
        }
    }

    fn method_frame(name: &str) -> StackFrame {
        StackFrame {
            instruction_pointer: 0x10,
            method: Some(MethodInfo {
                signature: name.to_string(),
                token: MethodToken(1),
                module_pdb_path: None,
                il_offset_map: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_threads_in_provider_order() {
        let names = ThreadNameIndex::default();
        let symbolicator = FrameSymbolicator::without_symbols();
        let threads = vec![thread(5, vec![]), thread(1, vec![]), thread(3, vec![])];

        let report = ReportAssembler::new(&names, &symbolicator).assemble(&threads);
        let ids: Vec<i32> =
            report.sections().iter().map(|s| s.header.managed_thread_id.0).collect();
        assert_eq!(ids, vec![5, 1, 3]);
    }

    #[test]
    fn test_frames_kept_in_order() {
        let names = ThreadNameIndex::default();
        let symbolicator = FrameSymbolicator::without_symbols();
        let t = thread(
            1,
            vec![
                method_frame("A.Inner()"),
                StackFrame { instruction_pointer: 0, method: None },
                method_frame("A.Outer()"),
            ],
        );

        let section = ReportAssembler::new(&names, &symbolicator).thread_section(&t);
        assert_eq!(section.header.name, "Unknown");
        assert_eq!(section.frames.len(), 3);
        assert_eq!(section.frames[1], SymbolicatedFrame::Internal);

        let text = section.to_string();
        assert!(text.contains("1:\tA.Inner()\n"));
        assert!(text.contains("2:\t[internal]\n"));
        assert!(text.contains("3:\tA.Outer()\n"));
    }

    #[test]
    fn test_exception_carried_over() {
        let names = ThreadNameIndex::default();
        let symbolicator = FrameSymbolicator::without_symbols();
        let mut t = thread(1, vec![]);
        t.current_exception = Some(ExceptionInfo {
            type_name: "System.TimeoutException".to_string(),
            message: "gave up".to_string(),
        });

        let section = ReportAssembler::new(&names, &symbolicator).thread_section(&t);
        assert_eq!(section.exception, t.current_exception);
    }

    #[test]
    fn test_frame_index_resets_per_thread() {
        let names = ThreadNameIndex::default();
        let symbolicator = FrameSymbolicator::without_symbols();
        let threads = vec![
            thread(1, vec![method_frame("A.One()"), method_frame("A.Two()")]),
            thread(2, vec![method_frame("B.One()")]),
        ];

        let text = ReportAssembler::new(&names, &symbolicator).assemble(&threads).to_string();
        assert!(text.contains("2:\tA.Two()\n"));
        assert!(text.contains("1:\tB.One()\n"));
        assert!(!text.contains("3:\t"));
    }
}
