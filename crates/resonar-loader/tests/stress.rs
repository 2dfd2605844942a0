//! Randomized load/unload interleavings over shared leaves.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use resonar_cooked::{
    AudioNodeCookedData, AuxBusCookedData, DialogueEventCookedData, EventCookedData,
    ExternalSourceCookedData, GroupValueCookedData, InitBankCookedData, LanguageCookedData,
    LocalizedAuxBusCookedData, LocalizedDialogueEventCookedData, LocalizedShareSetCookedData,
    LocalizedSoundBankCookedData, MediaCookedData, ShareSetCookedData, SoundBankCookedData,
};
use resonar_loader::{
    Completion, CookedSource, LoaderConfig, NodePtr, NodeType, ResourceLoader, promise,
};
use resonar_test_utils::MockSoundEngine;

// ============================================================================
// Helpers
// ============================================================================

/// A loaded node of any kind.
trait Held: Send {
    fn release(self: Box<Self>, loader: &ResourceLoader) -> Completion<()>;
}

impl<K: NodeType> Held for NodePtr<K> {
    fn release(self: Box<Self>, loader: &ResourceLoader) -> Completion<()> {
        loader.unload(*self)
    }
}

enum Slot {
    Free,
    Busy,
    Held(Box<dyn Held>),
}

type Slots = Arc<Vec<Mutex<Slot>>>;

/// splitmix64, so every run walks the same sequence.
struct Mixer(u64);

impl Mixer {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

fn media(id: u32) -> MediaCookedData {
    MediaCookedData::new(id, format!("Media_{id}"))
}

fn bank(id: u32) -> SoundBankCookedData {
    SoundBankCookedData::new(id, format!("Bank_{id}"))
}

fn load_boxed<C: CookedSource>(
    loader: &ResourceLoader,
    cooked: &C,
) -> Completion<Option<Box<dyn Held>>> {
    loader
        .load_cooked(cooked)
        .map(|node| node.map(|node| Box::new(node) as Box<dyn Held>))
}

/// Cooked data for every node kind, overlapping on a small pool of leaves.
struct Catalog {
    switch_on: GroupValueCookedData,
    state_a: GroupValueCookedData,
    switch_event: EventCookedData,
    state_event: EventCookedData,
    media: MediaCookedData,
    external_source: ExternalSourceCookedData,
    audio_node: AudioNodeCookedData,
    sound_bank: LocalizedSoundBankCookedData,
    aux_bus: LocalizedAuxBusCookedData,
    share_set: LocalizedShareSetCookedData,
    init_bank: InitBankCookedData,
    dialogue_event: LocalizedDialogueEventCookedData,
}

const OPERATIONS: usize = 12;

impl Catalog {
    fn new() -> Self {
        let sfx = LanguageCookedData::sfx;
        let switch_on = GroupValueCookedData::switch(1, 1);
        let state_a = GroupValueCookedData::state(2, 1);

        let mut branch = AudioNodeCookedData::new(10, "Branch");
        branch.media = vec![media(100), media(101)];
        let mut switch_event = EventCookedData::new(20, "Switch");
        switch_event.sound_banks.push(bank(200));
        switch_event
            .audio_nodes
            .insert([switch_on.clone()].into_iter().collect(), branch.clone());

        let mut state_event = EventCookedData::new(21, "State");
        state_event.media.push(media(101));
        state_event.required_group_value_set = [state_a.clone()].into_iter().collect();
        state_event.audio_nodes.insert(
            [state_a.clone(), switch_on.clone()].into_iter().collect(),
            {
                let mut node = AudioNodeCookedData::new(11, "Both");
                node.media.push(media(102));
                node
            },
        );

        let mut audio_node = AudioNodeCookedData::new(12, "Standalone");
        audio_node.media.push(media(100));
        audio_node
            .external_sources
            .push(ExternalSourceCookedData::new(300, "Line"));

        let mut dialogue = DialogueEventCookedData::new(30, "Dialogue");
        dialogue.sound_banks.push(bank(201));
        dialogue
            .audio_nodes
            .insert([switch_on.clone()].into_iter().collect(), branch);

        Self {
            switch_event,
            state_event,
            media: media(102),
            external_source: ExternalSourceCookedData::new(300, "Line"),
            audio_node,
            sound_bank: LocalizedSoundBankCookedData {
                sound_bank_language_map: [(sfx(), bank(200))].into_iter().collect(),
                debug_name: "Shared".into(),
                sound_bank_id: 200,
            },
            aux_bus: LocalizedAuxBusCookedData {
                aux_bus_language_map: [(
                    sfx(),
                    AuxBusCookedData {
                        aux_bus_id: 40,
                        sound_banks: vec![bank(201)],
                        media: vec![media(101)],
                        debug_name: "Bus".into(),
                    },
                )]
                .into_iter()
                .collect(),
                debug_name: "Bus".into(),
                aux_bus_id: 40,
            },
            share_set: LocalizedShareSetCookedData {
                share_set_language_map: [(
                    sfx(),
                    ShareSetCookedData {
                        share_set_id: 41,
                        sound_banks: Vec::new(),
                        media: vec![media(102)],
                        debug_name: "ShareSet".into(),
                    },
                )]
                .into_iter()
                .collect(),
                debug_name: "ShareSet".into(),
                share_set_id: 41,
            },
            init_bank: InitBankCookedData {
                sound_bank: bank(202),
                media: vec![media(100)],
                debug_name: "Init".into(),
            },
            dialogue_event: LocalizedDialogueEventCookedData {
                dialogue_event_language_map: [(sfx(), dialogue)].into_iter().collect(),
                debug_name: "Dialogue".into(),
                dialogue_event_id: 30,
                ..Default::default()
            },
            switch_on,
            state_a,
        }
    }

    fn load(&self, loader: &ResourceLoader, operation: usize) -> Completion<Option<Box<dyn Held>>> {
        match operation {
            0 => load_boxed(loader, &self.switch_on),
            1 => load_boxed(loader, &self.state_a),
            2 => load_boxed(loader, &self.switch_event),
            3 => load_boxed(loader, &self.state_event),
            4 => load_boxed(loader, &self.media),
            5 => load_boxed(loader, &self.external_source),
            6 => load_boxed(loader, &self.audio_node),
            7 => load_boxed(loader, &self.sound_bank),
            8 => load_boxed(loader, &self.aux_bus),
            9 => load_boxed(loader, &self.share_set),
            10 => load_boxed(loader, &self.init_bank),
            _ => load_boxed(loader, &self.dialogue_event),
        }
    }
}

const GATED_VALUES: u32 = 300;

fn gated_value(i: u32) -> GroupValueCookedData {
    GroupValueCookedData::switch(1, 15_000 + i)
}

/// One branch per gated value; neighbouring branches share media.
fn overlapping_event(id: u32) -> EventCookedData {
    let mut event = EventCookedData::new(id, "Overlapping");
    for i in 0..GATED_VALUES {
        let mut node = AudioNodeCookedData::new(1_000 + i, format!("Branch_{i}"));
        node.media = (i.saturating_sub(3)..=i)
            .map(|k| media(10_000 + k * 4 / 5))
            .collect();
        event
            .audio_nodes
            .insert([gated_value(i)].into_iter().collect(), node);
    }
    event
}

/// Same gating, two media per branch scattered over the same range.
fn scattered_event(id: u32) -> EventCookedData {
    let mut mixer = Mixer(142_401);
    let mut event = EventCookedData::new(id, "Scattered");
    for i in 0..GATED_VALUES {
        let mut node = AudioNodeCookedData::new(2_000 + i, format!("Scattered_{i}"));
        node.media = (0..2)
            .map(|_| media(10_000 + (mixer.next() % GATED_VALUES as u64) as u32 * 4 / 5))
            .collect();
        event
            .audio_nodes
            .insert([gated_value(i)].into_iter().collect(), node);
    }
    event
}

/// Unload `load`'s node as soon as it lands.
fn unload_when_loaded<K: NodeType>(
    loader: &ResourceLoader,
    load: Completion<Option<NodePtr<K>>>,
) -> Completion<()> {
    let (promise, unloaded) = promise::channel();
    let loader = loader.clone();
    load.then(move |node| match node {
        Some(node) => loader.unload_node(promise, node),
        None => promise.fulfill(()),
    });
    unloaded
}

fn wait_until_settled(slots: &Slots) {
    let deadline = Instant::now() + Duration::from_secs(60);
    while slots.iter().any(|slot| matches!(*slot.lock(), Slot::Busy)) {
        assert!(Instant::now() < deadline, "loads did not settle");
        thread::sleep(Duration::from_millis(1));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_random_operations() {
    const SLOTS_PER_OPERATION: usize = 4;

    let engine = Arc::new(MockSoundEngine::new());
    engine.set_media_delay(Some(Duration::from_micros(100)));
    let loader = ResourceLoader::new(LoaderConfig::default().with_worker_threads(4), engine.clone())
        .expect("loader starts");
    let catalog = Catalog::new();
    let slots: Slots = Arc::new(
        (0..OPERATIONS * SLOTS_PER_OPERATION)
            .map(|_| Mutex::new(Slot::Free))
            .collect(),
    );
    let mut unloads = Vec::new();
    let mut mixer = Mixer(0x5EED);

    for i in 0..10_000 {
        let roll = mixer.next();
        let operation = (roll % OPERATIONS as u64) as usize;
        let index = operation * SLOTS_PER_OPERATION
            + ((roll >> 16) % SLOTS_PER_OPERATION as u64) as usize;

        let mut slot = slots[index].lock();
        match std::mem::replace(&mut *slot, Slot::Free) {
            Slot::Busy => *slot = Slot::Busy,
            Slot::Held(node) => {
                drop(slot);
                unloads.push(node.release(&loader));
            }
            Slot::Free => {
                *slot = Slot::Busy;
                drop(slot);
                let slots = slots.clone();
                catalog.load(&loader, operation).then(move |node| {
                    *slots[index].lock() = match node {
                        Some(node) => Slot::Held(node),
                        None => Slot::Free,
                    };
                });
            }
        }

        if i % 100 == 99 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    wait_until_settled(&slots);
    for slot in slots.iter() {
        if let Slot::Held(node) = std::mem::replace(&mut *slot.lock(), Slot::Free) {
            unloads.push(node.release(&loader));
        }
    }
    for unload in unloads {
        unload.wait();
    }

    assert!(loader.is_empty());
    assert!(engine.is_idle());
    assert!(engine.total_registrations() > 0);
    assert_eq!(engine.total_registrations(), engine.total_unregistrations());
    loader.shutdown();
}

#[test]
fn test_sequential_audio_nodes() {
    const LOOPS: usize = 2;

    let engine = Arc::new(MockSoundEngine::new());
    engine.set_media_delay(Some(Duration::from_micros(200)));
    let loader = ResourceLoader::new(LoaderConfig::default().with_worker_threads(4), engine.clone())
        .expect("loader starts");
    let events = [overlapping_event(1), scattered_event(2)];
    let mut unloads = Vec::new();

    for _ in 0..LOOPS {
        let mut event_loads = [None, None];
        for i in 0..GATED_VALUES {
            if i == 0 {
                event_loads[0] = Some(loader.load_cooked(&events[0]));
            } else if i == GATED_VALUES / 4 * 3 {
                if let Some(load) = event_loads[0].take() {
                    unloads.push(unload_when_loaded(&loader, load));
                }
            }

            if i == GATED_VALUES / 4 * 2 {
                event_loads[1] = Some(loader.load_cooked(&events[1]));
            } else if i == GATED_VALUES - 1 {
                if let Some(load) = event_loads[1].take() {
                    unloads.push(unload_when_loaded(&loader, load));
                }
            }

            let switch = loader.load_cooked(&gated_value(i));
            unloads.push(unload_when_loaded(&loader, switch));

            if i % 100 == 0 {
                thread::sleep(Duration::from_millis(10));
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    assert_eq!(unloads.len(), (GATED_VALUES as usize + 2) * LOOPS);
    for unload in unloads {
        unload.wait();
    }

    assert!(loader.is_empty());
    assert!(engine.is_idle());
    assert!(engine.total_registrations() > 0);
    assert_eq!(engine.double_registrations(), 0);
    assert_eq!(engine.invalid_unregistrations(), 0);
    loader.shutdown();
}
