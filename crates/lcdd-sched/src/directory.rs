use lcdd_model::{ClientId, ScreenId};

/// Effectful operations the scheduler needs performed on actual model state,
/// implemented by whatever owns the `Client`/`Screen` table (the `Server` in
/// `lcdd-proto`).
pub trait ScreenDirectory {
    fn duration(&self, client: ClientId, screen: &ScreenId) -> Option<u32>;

    /// Decrement the screen's frame timeout, if it has one. `Some(true)`
    /// means it just reached zero and the caller must destroy it; `Some(false)`
    /// means it still has frames left; `None` means "no timeout" (§3: timeout
    /// counts down once per rendered frame, `None` is "none").
    fn tick_timeout(&mut self, client: ClientId, screen: &ScreenId) -> Option<bool>;

    /// Destroy the screen (and its widgets/reservations); already removed
    /// from the `ScreenList` by the caller.
    fn destroy(&mut self, client: ClientId, screen: &ScreenId);

    fn notify_listen(&mut self, client: ClientId, screen: &ScreenId);
    fn notify_ignore(&mut self, client: ClientId, screen: &ScreenId);
}
