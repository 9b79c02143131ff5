//! Headless in-memory collaborators.
//!
//! Stand-ins for the host container, media engine and hosting SDK that keep their state in
//! memory and run on a manual clock. The command-line driver plays against them, and the tests
//! use the [`Journal`] they share to check which calls reached the collaborators and in what
//! order.

mod engine;
mod sdk;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

pub use engine::SimMediaEngine;
pub use sdk::SimHostingSdk;

use crate::engine::{HostContainer, SharedContainer, SurfaceFit, SurfaceId};
use crate::geometry::PlaybackGeometry;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Surface ids are unique across every simulated collaborator in the process
pub(crate) fn next_surface_id() -> SurfaceId {
    NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn describe_geometry(geometry: &PlaybackGeometry) -> String {
    format!(
        "{},{} {}x{}",
        geometry.x, geometry.y, geometry.width, geometry.height
    )
}

/// Ordered record of calls made on simulated collaborators
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Index of the first entry equal to `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    /// Number of entries starting with `prefix`
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Most recent entry starting with `prefix`
    pub fn last_with_prefix(&self, prefix: &str) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|e| e.starts_with(prefix))
            .cloned()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// In-memory host container; the last child is drawn on top
#[derive(Debug, Clone, Default)]
pub struct SimContainer {
    children: Arc<Mutex<Vec<(SurfaceId, SurfaceFit)>>>,
    journal: Journal,
}

impl SimContainer {
    pub fn new(journal: Journal) -> Self {
        Self {
            children: Arc::default(),
            journal,
        }
    }

    /// A handle to this container that players can share
    pub fn shared(&self) -> SharedContainer {
        Arc::new(Mutex::new(self.clone()))
    }

    /// Attached surfaces, bottom to top
    pub fn children(&self) -> Vec<SurfaceId> {
        self.children.lock().iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }

    pub fn top(&self) -> Option<SurfaceId> {
        self.children.lock().last().map(|(id, _)| *id)
    }

    pub fn fit_of(&self, id: SurfaceId) -> Option<SurfaceFit> {
        self.children
            .lock()
            .iter()
            .find(|(child, _)| *child == id)
            .map(|(_, fit)| *fit)
    }
}

impl HostContainer for SimContainer {
    fn add_surface(&mut self, id: SurfaceId, fit: SurfaceFit) {
        self.journal.record(format!("container add {}", id));
        self.children.lock().push((id, fit));
    }

    fn remove_surface(&mut self, id: SurfaceId) {
        self.journal.record(format!("container remove {}", id));
        self.children.lock().retain(|(child, _)| *child != id);
    }

    fn raise_surface(&mut self, id: SurfaceId) {
        let mut children = self.children.lock();
        if let Some(index) = children.iter().position(|(child, _)| *child == id) {
            let child = children.remove(index);
            children.push(child);
            self.journal.record(format!("container raise {}", id));
        }
    }
}
