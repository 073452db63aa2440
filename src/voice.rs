//! Session ownership for the two voice features. At most one module may hold
//! the microphone at a time; a grant is handed to a state machine at
//! construction and released when it drops.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceModule {
    Assistant,
    MedicineWizard,
}

#[derive(Clone, Default)]
pub struct VoiceArbiter {
    active: Arc<Mutex<Option<VoiceModule>>>,
}

impl VoiceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant the voice slot to `module`, unless another grant is live.
    pub fn try_acquire(&self, module: VoiceModule) -> Option<VoiceGrant> {
        let mut slot = self.active.lock().ok()?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(module);
        Some(VoiceGrant { arbiter: self.clone(), module })
    }

    pub fn active(&self) -> Option<VoiceModule> {
        self.active.lock().ok().and_then(|slot| *slot)
    }
}

/// Exclusive hold on the voice slot. Dropping it releases the slot.
pub struct VoiceGrant {
    arbiter: VoiceArbiter,
    module: VoiceModule,
}

impl VoiceGrant {
    pub fn module(&self) -> VoiceModule {
        self.module
    }
}

impl Drop for VoiceGrant {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.arbiter.active.lock() {
            *slot = None;
        }
    }
}
