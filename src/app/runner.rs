use crate::app::error::{Error, Result};
use crate::app::formatter::{spawn_error, Formatter};
use crate::app::models::{Action, FileSet, RunReport, RunnerKind, RuntimeConfig};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// GNU parallel exits with 255 for its own errors; lower codes count failed jobs.
const PARALLEL_INTERNAL_ERROR: i32 = 255;

/// Fans a file set out over formatter invocations.
pub trait BatchRunner {
    fn run(&self, root: &Path, action: Action, files: &FileSet) -> Result<RunReport>;
}

/// Splits `files` into contiguous batches of at most `size` files.
pub fn batches(files: &[PathBuf], size: usize) -> std::slice::Chunks<'_, PathBuf> {
    files.chunks(size.max(1))
}

pub fn build_runner(
    config: &RuntimeConfig,
    formatter: Arc<dyn Formatter>,
) -> Box<dyn BatchRunner> {
    match config.runner {
        RunnerKind::Parallel => Box::new(GnuParallel {
            program: config.parallel.clone(),
            formatter,
            batch_size: config.batch_size,
            jobs: config.jobs,
        }),
        RunnerKind::Builtin => Box::new(InProcess {
            formatter,
            batch_size: config.batch_size,
            jobs: config.jobs,
        }),
    }
}

/// Delegates scheduling to GNU parallel, feeding it a NUL-delimited file list.
pub struct GnuParallel {
    pub program: String,
    pub formatter: Arc<dyn Formatter>,
    pub batch_size: usize,
    pub jobs: usize,
}

impl GnuParallel {
    pub fn command_args(&self, action: Action) -> Vec<String> {
        let halt = if action.fail_fast() {
            "now,fail=1"
        } else {
            "never"
        };
        let mut args = vec![
            "--will-cite".to_string(),
            "--null".to_string(),
            "--max-args".to_string(),
            self.batch_size.max(1).to_string(),
            "--jobs".to_string(),
            self.jobs.max(1).to_string(),
            "--halt".to_string(),
            halt.to_string(),
            "--quote".to_string(),
            self.formatter.program().to_string(),
        ];
        args.extend(self.formatter.action_args(action));
        args
    }
}

impl BatchRunner for GnuParallel {
    fn run(&self, root: &Path, action: Action, files: &FileSet) -> Result<RunReport> {
        let total = batches(&files.files, self.batch_size).len();
        if total == 0 {
            return Ok(RunReport::default());
        }
        self.formatter.ensure_available()?;

        let mut child = Command::new(&self.program)
            .args(self.command_args(action))
            .current_dir(root)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            for file in &files.files {
                let written = stdin
                    .write_all(file.as_os_str().as_encoded_bytes())
                    .and_then(|()| stdin.write_all(b"\0"));
                match written {
                    Ok(()) => {}
                    // parallel stops reading once it halts
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => break,
                    Err(e) => return Err(spawn_error(&self.program, e)),
                }
            }
        }

        let status = child.wait().map_err(|e| spawn_error(&self.program, e))?;
        if status.success() {
            return Ok(RunReport {
                batches: total,
                dispatched: total,
                failed: 0,
                cancelled: false,
            });
        }

        match status.code() {
            Some(code) if code != PARALLEL_INTERNAL_ERROR => {
                let failed = if action.fail_fast() {
                    1
                } else {
                    (code as usize).min(total)
                };
                // the halt happens inside parallel, so dispatch counts are not observable
                Ok(RunReport {
                    batches: total,
                    dispatched: total,
                    failed,
                    cancelled: false,
                })
            }
            _ => Err(Error::ToolFailed {
                tool: self.program.clone(),
                status,
            }),
        }
    }
}

/// Runs batches on a rayon pool, with cooperative cancellation in check mode.
pub struct InProcess {
    pub formatter: Arc<dyn Formatter>,
    pub batch_size: usize,
    pub jobs: usize,
}

impl BatchRunner for InProcess {
    fn run(&self, root: &Path, action: Action, files: &FileSet) -> Result<RunReport> {
        let work: Vec<&[PathBuf]> = batches(&files.files, self.batch_size).collect();
        if work.is_empty() {
            return Ok(RunReport::default());
        }

        let workers = self.jobs.max(1).min(work.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;

        let cursor = AtomicUsize::new(0);
        let dispatched = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let cancel = AtomicBool::new(false);
        let fatal: Mutex<Option<Error>> = Mutex::new(None);

        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| loop {
                    if cancel.load(Ordering::SeqCst) {
                        break;
                    }
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(batch) = work.get(index) else {
                        break;
                    };
                    dispatched.fetch_add(1, Ordering::SeqCst);
                    log::debug!(
                        "Batch {} of {} ({} files)",
                        index + 1,
                        work.len(),
                        batch.len()
                    );

                    match self.formatter.run_batch(root, action, batch) {
                        Ok(()) => {}
                        Err(err @ Error::ToolSpawn { .. }) => {
                            cancel.store(true, Ordering::SeqCst);
                            if let Ok(mut slot) = fatal.lock() {
                                slot.get_or_insert(err);
                            }
                        }
                        Err(err) => {
                            failed.fetch_add(1, Ordering::SeqCst);
                            if action.fail_fast() {
                                cancel.store(true, Ordering::SeqCst);
                            } else {
                                log::warn!("Batch {} failed: {}", index + 1, err);
                            }
                        }
                    }
                });
            }
        });

        if let Some(err) = fatal.into_inner().ok().flatten() {
            return Err(err);
        }

        Ok(RunReport {
            batches: work.len(),
            dispatched: dispatched.into_inner(),
            failed: failed.into_inner(),
            cancelled: cancel.into_inner(),
        })
    }
}
