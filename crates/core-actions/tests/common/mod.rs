#![allow(dead_code)] // Shared across integration test binaries; each uses a subset.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use core_actions::{BufferIo, Editor};
use core_events::{CompletedJob, CompletionFn, JobFn, JobHandle, JobRunner};
use core_state::{RegisterContent, RegisterName};
use core_text::LineBuffer;

pub fn editor(text: &str) -> Editor {
    Editor::new(LineBuffer::from_str("test", text))
}

/// Feed a notation string (`"d2w"`, `"ihi<Esc>"`) through the resolver.
pub fn keys(ed: &mut Editor, notation: &str) {
    ed.feed_keys(notation).expect("valid key notation");
}

pub fn lines(ed: &Editor) -> Vec<String> {
    ed.state().buffer.lines().to_vec()
}

pub fn text(ed: &Editor) -> String {
    lines(ed).join("\n")
}

pub fn reg(ed: &Editor, name: char) -> Option<RegisterContent> {
    ed.state()
        .registers
        .peek(RegisterName::from_char(name).expect("register name"))
}

pub fn reg_text(ed: &Editor, name: char) -> Option<String> {
    reg(ed, name).map(|c| c.text)
}

/// In-memory buffer I/O; clones share the same file table.
#[derive(Clone, Default)]
pub struct MemIo {
    pub files: Rc<RefCell<HashMap<PathBuf, Vec<String>>>>,
}

impl MemIo {
    pub fn with_file(path: &str, content: &[&str]) -> Self {
        let io = Self::default();
        io.files.borrow_mut().insert(
            PathBuf::from(path),
            content.iter().map(|s| s.to_string()).collect(),
        );
        io
    }

    pub fn get(&self, path: &str) -> Option<Vec<String>> {
        self.files.borrow().get(Path::new(path)).cloned()
    }
}

impl BufferIo for MemIo {
    fn load(&self, path: &Path) -> anyhow::Result<Vec<String>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{} not found", path.display()))
    }

    fn save(&self, path: &Path, lines: &[String]) -> anyhow::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), lines.to_vec());
        Ok(())
    }
}

pub fn editor_with_io(text: &str, io: &MemIo) -> Editor {
    let mut ed = editor(text);
    ed.set_buffer_io(Box::new(io.clone()));
    ed
}

/// Runs each job synchronously inside `run_async`; `poll` hands the results
/// back.
#[derive(Default)]
pub struct InlineJobs {
    next: u64,
    done: Vec<CompletedJob>,
}

impl JobRunner for InlineJobs {
    fn run_async(
        &mut self,
        label: &str,
        job: JobFn,
        on_complete: Option<CompletionFn>,
    ) -> JobHandle {
        self.next += 1;
        let handle = JobHandle(self.next);
        let completed = CompletedJob {
            handle,
            label: label.to_string(),
            outcome: job(),
        };
        if let Some(cb) = on_complete {
            cb(&completed);
        }
        self.done.push(completed);
        handle
    }

    fn poll(&mut self) -> Vec<CompletedJob> {
        std::mem::take(&mut self.done)
    }

    fn in_flight(&self) -> usize {
        self.done.len()
    }
}
