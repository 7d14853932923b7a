// src/adapter/submit.rs

//! Client side of the synchronous batch-queue submission.

use std::path::Path;

use crate::config::RemoteSection;

/// Queue class encoding the memory and wall-time budget, e.g. `o_cpu_8G_8H`.
pub fn queue_class(memory_gib: u64, wall_hours: u32) -> String {
    format!("o_cpu_{memory_gib}G_{wall_hours}H")
}

/// Wraps a command into a blocking submission (`-K` waits for the remote job
/// and propagates its exit status).
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub remote: &'a RemoteSection,
    pub name: &'a str,
    pub slots: u32,
    pub memory_gib: u64,
    pub wall_hours: u32,
    pub log: &'a Path,
}

impl Submission<'_> {
    pub fn wrap(&self, command: &str) -> String {
        let log = self.log.display();
        let mut cmd = format!(
            "{} -P {} -m {} -env all -q {} -K -J {}",
            self.remote.submit_bin,
            self.remote.project,
            self.remote.resource_class,
            queue_class(self.memory_gib, self.wall_hours),
            self.name,
        );
        if self.slots > 1 {
            cmd.push_str(&format!(" -n {} -R 'span[hosts=1]'", self.slots));
        }
        cmd.push_str(&format!(" -oo {log} -eo {log}.err {}", command.trim()));
        cmd
    }
}
