use baston::voice::{VoiceArbiter, VoiceModule};

#[test]
fn only_one_voice_module_may_be_active() {
    let arbiter = VoiceArbiter::new();

    let grant = arbiter.try_acquire(VoiceModule::Assistant).expect("slot should be free");
    assert_eq!(grant.module(), VoiceModule::Assistant);
    assert_eq!(arbiter.active(), Some(VoiceModule::Assistant));

    assert!(
        arbiter.try_acquire(VoiceModule::MedicineWizard).is_none(),
        "the wizard must not start while the assistant holds the slot"
    );
    assert!(
        arbiter.try_acquire(VoiceModule::Assistant).is_none(),
        "not even the same module may double-acquire"
    );
}

#[test]
fn dropping_a_grant_releases_the_slot() {
    let arbiter = VoiceArbiter::new();

    let grant = arbiter.try_acquire(VoiceModule::Assistant).expect("slot should be free");
    drop(grant);

    assert_eq!(arbiter.active(), None);
    let wizard_grant = arbiter.try_acquire(VoiceModule::MedicineWizard);
    assert!(wizard_grant.is_some(), "a released slot is immediately reusable");
}

#[test]
fn arbiter_clones_share_the_same_slot() {
    let arbiter = VoiceArbiter::new();
    let view = arbiter.clone();

    let _grant = arbiter.try_acquire(VoiceModule::Assistant).expect("slot should be free");
    assert_eq!(view.active(), Some(VoiceModule::Assistant));
    assert!(view.try_acquire(VoiceModule::MedicineWizard).is_none());
}
