use crate::directory::ScreenDirectory;
use lcdd_model::{ClientId, Priority, ScreenId, DEFAULT_DURATION_FRAMES};

struct Entry {
    client: ClientId,
    screen: ScreenId,
    priority: Priority,
    seq: u64,
}

/// Union of all screens across all clients, ordered by priority class
/// descending with stable (insertion-order) tie-breaking (§4.3).
pub struct ScreenList {
    entries: Vec<Entry>,
    next_seq: u64,
    current: Option<(ClientId, ScreenId)>,
    current_screen_start_frame: u32,
}

impl Default for ScreenList {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
            current: None,
            current_screen_start_frame: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn current(&self) -> Option<(ClientId, ScreenId)> {
        self.current.clone()
    }

    pub fn current_screen_start_frame(&self) -> u32 {
        self.current_screen_start_frame
    }

    pub fn contains(&self, client: ClientId, screen: &ScreenId) -> bool {
        self.entries.iter().any(|e| e.client == client && &e.screen == screen)
    }

    pub fn insert(&mut self, client: ClientId, screen: ScreenId, priority: Priority) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { client, screen, priority, seq });
        self.resort();
    }

    pub fn update_priority(&mut self, client: ClientId, screen: &ScreenId, priority: Priority) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.client == client && &e.screen == screen) {
            e.priority = priority;
        }
        self.resort();
    }

    /// Removes the screen from the list. If it was `current`, the caller
    /// must run another `tick` to reselect (§4.4: "the scheduler will pick a
    /// replacement on the next tick").
    pub fn remove(&mut self, client: ClientId, screen: &ScreenId) {
        self.entries.retain(|e| !(e.client == client && &e.screen == screen));
        if self.current.as_ref() == Some(&(client, screen.clone())) {
            self.current = None;
        }
    }

    fn resort(&mut self) {
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
    }

    /// Highest-priority screen in the list, never `HIDDEN` per §8's
    /// invariant ("the scheduler never selects a screen with priority
    /// HIDDEN").
    pub fn head(&self) -> Option<(ClientId, ScreenId, Priority)> {
        self.entries
            .iter()
            .find(|e| e.priority != Priority::Hidden)
            .map(|e| (e.client, e.screen.clone(), e.priority))
    }

    fn priority_of(&self, client: ClientId, screen: &ScreenId) -> Option<Priority> {
        self.entries
            .iter()
            .find(|e| e.client == client && &e.screen == screen)
            .map(|e| e.priority)
    }

    /// The next screen at the same priority tier as `(client, screen)`,
    /// wrapping within that tier only (§4.3 manual navigation / autorotate).
    pub fn next_in_tier(&self, client: ClientId, screen: &ScreenId) -> Option<(ClientId, ScreenId)> {
        let priority = self.priority_of(client, screen)?;
        let tier: Vec<&Entry> = self.entries.iter().filter(|e| e.priority == priority).collect();
        if tier.len() <= 1 {
            return None;
        }
        let idx = tier.iter().position(|e| e.client == client && &e.screen == screen)?;
        let next = tier[(idx + 1) % tier.len()];
        Some((next.client, next.screen.clone()))
    }

    pub fn prev_in_tier(&self, client: ClientId, screen: &ScreenId) -> Option<(ClientId, ScreenId)> {
        let priority = self.priority_of(client, screen)?;
        let tier: Vec<&Entry> = self.entries.iter().filter(|e| e.priority == priority).collect();
        if tier.len() <= 1 {
            return None;
        }
        let idx = tier.iter().position(|e| e.client == client && &e.screen == screen)?;
        let prev = tier[(idx + tier.len() - 1) % tier.len()];
        Some((prev.client, prev.screen.clone()))
    }

    /// §4.3 `switch_to`: emits `ignore` before `listen`, resets the start
    /// frame, no-ops if already current.
    pub fn switch_to(
        &mut self,
        target: Option<(ClientId, ScreenId, Priority)>,
        frame_counter: u32,
        dir: &mut dyn ScreenDirectory,
    ) {
        let target_key = target.as_ref().map(|(c, s, _)| (*c, s.clone()));
        if target_key == self.current {
            return;
        }
        if let Some((oc, os)) = self.current.take() {
            dir.notify_ignore(oc, &os);
        }
        if let Some((c, s, _)) = &target {
            dir.notify_listen(*c, s);
        }
        self.current = target_key;
        self.current_screen_start_frame = frame_counter;
        tracing::debug!(target: "sched", current = ?self.current, frame = frame_counter, "switched current screen");
    }

    /// Runs one scheduler tick (§4.3 steps 1-5), called once per frame after
    /// command dispatch and before render.
    pub fn tick(&mut self, frame_counter: u32, autorotate: bool, dir: &mut dyn ScreenDirectory) {
        // Step 1.
        if self.entries.is_empty() {
            self.current = None;
            return;
        }

        // Step 2.
        if self.current.is_none() {
            if let Some(head) = self.head() {
                self.switch_to(Some(head), frame_counter, dir);
            }
            return;
        }

        // Step 3.
        let (cc, cs) = self.current.clone().unwrap();
        if let Some(expired) = dir.tick_timeout(cc, &cs) {
            if expired {
                dir.destroy(cc, &cs);
                self.remove(cc, &cs);
            }
        }

        // Step 4.
        let current_priority = self.current.as_ref().and_then(|(c, s)| self.priority_of(*c, s));
        match self.head() {
            None => {
                self.current = None;
                return;
            }
            Some((hc, hs, hp)) => {
                let should_switch = match current_priority {
                    None => true, // step 3 just destroyed current; reselect now rather than wait a tick
                    Some(cp) => hp > cp,
                };
                if should_switch {
                    self.switch_to(Some((hc, hs, hp)), frame_counter, dir);
                    return;
                }
            }
        }

        // Step 5: autorotate within the rotatable band.
        if autorotate {
            if let Some((cc2, cs2)) = self.current.clone() {
                if let Some(p) = self.priority_of(cc2, &cs2) {
                    if p.is_rotatable() {
                        let duration = dir.duration(cc2, &cs2).unwrap_or(DEFAULT_DURATION_FRAMES);
                        if frame_counter.wrapping_sub(self.current_screen_start_frame) >= duration {
                            if let Some((nc, ns)) = self.next_in_tier(cc2, &cs2) {
                                self.switch_to(Some((nc, ns, p)), frame_counter, dir);
                            }
                        }
                    }
                }
            }
        }
    }
}
