//! Dynamic dialogue resolution against the mock engine.

use std::sync::Arc;

use resonar_cooked::{
    AudioNodeCookedData, AudioNodeLoading, DialogueArgumentItem, DialogueEventCookedData,
    GroupType, GroupValueCookedData, LanguageCookedData, LocalizedDialogueEventCookedData,
    MediaCookedData, RequiredArguments, SoundBankCookedData,
};
use resonar_loader::{DialogueEvent, LoaderConfig, LoaderError, ResourceLoader};
use resonar_test_utils::{CandidateCallback, DynamicDialogue, LeafKind, MockSoundEngine};

// ============================================================================
// Helpers
// ============================================================================

const DIALOGUE_ID: u32 = 100;

fn setup() -> (Arc<MockSoundEngine>, ResourceLoader) {
    resonar_core::logging::init();
    let engine = Arc::new(MockSoundEngine::new());
    let loader = ResourceLoader::new(LoaderConfig::default().with_worker_threads(2), engine.clone())
        .expect("loader starts");
    (engine, loader)
}

fn teardown(engine: &MockSoundEngine, loader: &ResourceLoader) {
    assert!(loader.is_empty(), "loader still tracks resources");
    assert!(engine.is_idle(), "engine still has {} live leaves", engine.live_count());
    loader.shutdown();
}

fn audio_node(id: u32, media_id: u32, loading: AudioNodeLoading) -> AudioNodeCookedData {
    let mut node = AudioNodeCookedData::new(id, format!("Line_{id}"));
    node.media.push(MediaCookedData::new(media_id, format!("Media_{media_id}")));
    node.audio_node_loading = loading;
    node
}

fn speaker(id: u32) -> GroupValueCookedData {
    GroupValueCookedData::switch(1, id)
}

fn mood(id: u32) -> GroupValueCookedData {
    GroupValueCookedData::state(2, id)
}

/// Two declared arguments: the speaker switch at 0, the mood state at 1.
fn greeting() -> LocalizedDialogueEventCookedData {
    let mut cooked = DialogueEventCookedData::new(DIALOGUE_ID, "Greeting");
    cooked.sound_banks.push(SoundBankCookedData::new(500, "VO_Greeting"));
    cooked.audio_nodes.insert(
        [speaker(11), mood(22)].into_iter().collect(),
        audio_node(201, 301, AudioNodeLoading::LoadOnResolve),
    );
    cooked.audio_nodes.insert(
        [speaker(12)].into_iter().collect(),
        audio_node(202, 302, AudioNodeLoading::LoadOnEnqueue),
    );
    cooked.audio_nodes.insert(
        [speaker(13)].into_iter().collect(),
        audio_node(203, 303, AudioNodeLoading::AlwaysLoad),
    );

    LocalizedDialogueEventCookedData {
        dialogue_event_language_map: [(LanguageCookedData::sfx(), cooked)]
            .into_iter()
            .collect(),
        debug_name: "Greeting".into(),
        dialogue_event_id: DIALOGUE_ID,
        required_arguments: RequiredArguments::new()
            .with(DialogueArgumentItem::new(GroupType::Switch, 1), 0)
            .with(DialogueArgumentItem::new(GroupType::State, 2), 1),
    }
}

fn dialogue_event(
    engine: &Arc<MockSoundEngine>,
    loader: &ResourceLoader,
    cooked: LocalizedDialogueEventCookedData,
) -> DialogueEvent {
    let resolver: Arc<dyn DynamicDialogue> = engine.clone();
    DialogueEvent::new(cooked, loader.clone(), resolver)
}

fn finish(dialogue: DialogueEvent) {
    dialogue.unload_data().wait();
    drop(dialogue);
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_ordered_resolution_loads_the_node() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[11, 22], 201);
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());
    assert!(engine.is_live(LeafKind::SoundBank, 500));

    let object = dialogue
        .resolve_ordered_arguments(&[Some(&speaker(11)), Some(&mood(22))])
        .expect("resolves");
    assert_eq!(object.audio_node_id(), 201);
    assert!(object.load_data().wait());
    assert!(engine.is_live(LeafKind::Media, 301));
    assert_eq!(engine.dialogue_calls(), vec![(DIALOGUE_ID, vec![11, 22])]);

    drop(object);
    finish(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_event_without_sound_banks_is_loaded() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[11, 22], 201);
    let mut cooked = greeting();
    for dialogue in cooked.dialogue_event_language_map.values_mut() {
        dialogue.sound_banks.clear();
    }
    let dialogue = dialogue_event(&engine, &loader, cooked);
    assert!(dialogue.load_data());
    assert!(dialogue.is_loaded());

    let (s, m) = (speaker(11), mood(22));
    let object = dialogue
        .try_resolve(&[Some(&s), Some(&m)], true, None)
        .expect("resolves without banks");
    assert_eq!(object.audio_node_id(), 201);

    drop(object);
    finish(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_wrong_argument_count_never_reaches_the_engine() {
    let (engine, loader) = setup();
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());

    let (s, m) = (speaker(11), mood(22));
    let one = [Some(&s)];
    let three = [Some(&s), Some(&m), None];
    assert!(dialogue.resolve_ordered_arguments(&one).is_none());
    assert!(dialogue.resolve_ordered_arguments(&three).is_none());
    assert!(matches!(
        dialogue.try_resolve(&one, true, None),
        Err(LoaderError::ArgumentCountMismatch {
            expected: 2,
            supplied: 1
        })
    ));
    assert!(engine.dialogue_calls().is_empty());

    finish(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_unordered_resolution_uses_fallback() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[0, 22], 201);
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());

    let object = dialogue.resolve_arguments(&[&mood(22)]).expect("resolves");
    assert_eq!(engine.dialogue_calls(), vec![(DIALOGUE_ID, vec![0, 22])]);
    assert_eq!(object.audio_node_id(), 201);

    drop(object);
    finish(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_unresolved_path_yields_none() {
    let (engine, loader) = setup();
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());

    assert!(matches!(
        dialogue.try_resolve(&[Some(&speaker(99)), None], true, None),
        Err(LoaderError::ResolveFailed {
            dialogue_event_id: DIALOGUE_ID
        })
    ));

    finish(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_resolution_requires_loaded_event() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[11, 22], 201);
    let dialogue = dialogue_event(&engine, &loader, greeting());

    assert!(matches!(
        dialogue.try_resolve(&[Some(&speaker(11)), Some(&mood(22))], true, None),
        Err(LoaderError::NotLoaded { .. })
    ));
    assert!(engine.dialogue_calls().is_empty());

    drop(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_candidate_callback_can_veto() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[11, 22], 201);
    engine.script_dialogue(DIALOGUE_ID, &[0, 22], 202);
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());

    let mut seen = Vec::new();
    let mut skip_exact = |_: u32, audio_node_id: u32| {
        seen.push(audio_node_id);
        audio_node_id != 201
    };
    let candidate: &mut CandidateCallback<'_> = &mut skip_exact;
    let object = dialogue
        .resolve(&[Some(&speaker(11)), Some(&mood(22))], true, Some(candidate))
        .expect("fallback candidate accepted");
    assert_eq!(object.audio_node_id(), 202);
    assert_eq!(seen.first(), Some(&201));
    assert_eq!(seen.last(), Some(&202));

    drop(object);
    finish(dialogue);
    teardown(&engine, &loader);
}

// ============================================================================
// Loading policies and caching
// ============================================================================

#[test]
fn test_always_load_nodes_load_with_the_event() {
    let (engine, loader) = setup();
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());

    assert!(engine.is_live(LeafKind::Media, 303));
    assert!(!engine.is_live(LeafKind::Media, 301));
    let cached = loader.known_audio_nodes().get(203).expect("cached globally");
    assert!(cached.is_loaded());
    drop(cached);

    finish(dialogue);
    assert!(loader.known_audio_nodes().get(203).is_none());
    teardown(&engine, &loader);
}

#[test]
fn test_load_on_enqueue_is_not_loaded_by_resolution() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[12, 0], 202);
    let dialogue = dialogue_event(&engine, &loader, greeting());
    assert!(dialogue.load_data());

    let object = dialogue
        .resolve_ordered_arguments(&[Some(&speaker(12)), None])
        .expect("resolves");
    assert!(!object.is_loaded());
    assert!(!object.is_loading());
    assert!(!engine.is_live(LeafKind::Media, 302));

    assert!(object.load_data().wait());
    assert!(engine.is_live(LeafKind::Media, 302));
    object.unload_data().wait();
    assert!(!engine.is_live(LeafKind::Media, 302));

    drop(object);
    finish(dialogue);
    teardown(&engine, &loader);
}

#[test]
fn test_objects_are_shared_between_dialogue_events() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[11, 22], 201);
    let first = dialogue_event(&engine, &loader, greeting());
    let second = dialogue_event(&engine, &loader, greeting());
    assert!(first.load_data());
    assert!(second.load_data());

    let (s, m) = (speaker(11), mood(22));
    let arguments = [Some(&s), Some(&m)];
    let a = first.resolve_ordered_arguments(&arguments).unwrap();
    let b = second.resolve_ordered_arguments(&arguments).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.load_data().wait());
    assert_eq!(engine.register_count(LeafKind::Media, 301), 1);

    drop((a, b));
    finish(first);
    finish(second);
    teardown(&engine, &loader);
}

#[test]
fn test_unloading_one_event_keeps_shared_objects() {
    let (engine, loader) = setup();
    engine.script_dialogue(DIALOGUE_ID, &[11, 22], 201);
    let first = dialogue_event(&engine, &loader, greeting());
    let second = dialogue_event(&engine, &loader, greeting());
    assert!(first.load_data());
    assert!(second.load_data());

    let (s, m) = (speaker(11), mood(22));
    let arguments = [Some(&s), Some(&m)];
    let a = first.resolve_ordered_arguments(&arguments).unwrap();
    let b = second.resolve_ordered_arguments(&arguments).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.load_data().wait());
    drop((a, b));

    finish(first);
    let shared = loader.known_audio_nodes().get(201).expect("still held");
    assert!(shared.is_loaded());
    assert!(engine.is_live(LeafKind::Media, 301));
    assert_eq!(engine.register_count(LeafKind::Media, 301), 1);
    drop(shared);

    finish(second);
    assert!(!engine.is_live(LeafKind::Media, 301));
    teardown(&engine, &loader);
}

#[test]
fn test_wildcard_template_takes_resolved_id() {
    let (engine, loader) = setup();
    let mut cooked = DialogueEventCookedData::new(110, "Bark");
    cooked.audio_nodes.insert(
        [speaker(0)].into_iter().collect(),
        audio_node(0, 310, AudioNodeLoading::LoadOnResolve),
    );
    let localized = LocalizedDialogueEventCookedData {
        dialogue_event_language_map: [(LanguageCookedData::sfx(), cooked)]
            .into_iter()
            .collect(),
        debug_name: "Bark".into(),
        dialogue_event_id: 110,
        required_arguments: RequiredArguments::new()
            .with(DialogueArgumentItem::new(GroupType::Switch, 1), 0),
    };
    engine.script_dialogue(110, &[14], 777);
    engine.script_dialogue(110, &[15], 778);

    let dialogue = dialogue_event(&engine, &loader, localized);
    assert!(dialogue.load_data());

    let first = dialogue.resolve_arguments(&[&speaker(14)]).unwrap();
    let second = dialogue.resolve_arguments(&[&speaker(15)]).unwrap();
    assert_eq!(first.audio_node_id(), 777);
    assert_eq!(second.audio_node_id(), 778);
    assert_eq!(first.cooked().media[0].media_id, 310);
    assert!(first.load_data().wait());
    assert!(second.load_data().wait());
    assert_eq!(engine.register_count(LeafKind::Media, 310), 1);

    drop((first, second));
    finish(dialogue);
    teardown(&engine, &loader);
}
