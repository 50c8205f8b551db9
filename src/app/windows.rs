//! Keeps the per-API comparison windows together.
//!
//! Every registered API gets its own window so the same problem can be compared
//! side by side. Dragging one window drags all of them by the same offset, and a
//! close request on any of them ends the whole application: the windows share
//! GPU state and are torn down together.

use std::sync::Arc;

use winit::dpi::{PhysicalPosition, Position};
use winit::window::{Window, WindowId};

/// What the coordinator needs from a platform window.
pub trait CoordinatedWindow {
    /// Stable identifier of the window.
    fn id(&self) -> WindowId;
    /// Current outer position, if the platform reports one.
    fn outer_position(&self) -> Option<PhysicalPosition<i32>>;
    /// Requests a new outer position.
    fn set_outer_position(&self, position: PhysicalPosition<i32>);
}

impl CoordinatedWindow for Arc<Window> {
    fn id(&self) -> WindowId {
        Window::id(self)
    }

    fn outer_position(&self) -> Option<PhysicalPosition<i32>> {
        Window::outer_position(self).ok()
    }

    fn set_outer_position(&self, position: PhysicalPosition<i32>) {
        Window::set_outer_position(self, Position::Physical(position));
    }
}

struct Tracked<W> {
    window: W,
    position: Option<PhysicalPosition<i32>>,
    /// Set by the window's first `Moved` event, which reports where the window
    /// manager placed it rather than a user drag.
    placed: bool,
}

/// Moves windows as a group and turns any close request into a quit.
pub struct MultiWindowCoordinator<W> {
    windows: Vec<Tracked<W>>,
    quit_requested: bool,
}

impl<W: CoordinatedWindow> MultiWindowCoordinator<W> {
    /// Starts tracking `windows` at their current positions.
    pub fn new(windows: impl IntoIterator<Item = W>) -> Self {
        let windows = windows
            .into_iter()
            .map(|window| {
                let position = window.outer_position();
                Tracked {
                    window,
                    position,
                    placed: false,
                }
            })
            .collect();
        Self {
            windows,
            quit_requested: false,
        }
    }

    /// Number of coordinated windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// `true` when no window is tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Iterates over the coordinated windows.
    pub fn windows(&self) -> impl Iterator<Item = &W> {
        self.windows.iter().map(|tracked| &tracked.window)
    }

    /// Looks a window up by id.
    pub fn get(&self, id: WindowId) -> Option<&W> {
        self.windows
            .iter()
            .find(|tracked| tracked.window.id() == id)
            .map(|tracked| &tracked.window)
    }

    /// Shifts every other window by the distance `moved` travelled.
    ///
    /// Moves we caused ourselves come back as events at the position we already
    /// recorded, so they produce a zero offset and do not ripple further. A
    /// window's first event only records where it was placed.
    pub fn on_window_moved(&mut self, moved: WindowId, new_position: PhysicalPosition<i32>) {
        let Some(index) = self
            .windows
            .iter()
            .position(|tracked| tracked.window.id() == moved)
        else {
            return;
        };

        let tracked = &mut self.windows[index];
        let previous = tracked.position.replace(new_position);
        if !std::mem::replace(&mut tracked.placed, true) {
            return;
        }
        let Some(previous) = previous else {
            return;
        };
        let dx = new_position.x - previous.x;
        let dy = new_position.y - previous.y;
        if dx == 0 && dy == 0 {
            return;
        }

        for (other, tracked) in self.windows.iter_mut().enumerate() {
            if other == index {
                continue;
            }
            let Some(current) = tracked.position.or_else(|| tracked.window.outer_position())
            else {
                continue;
            };
            let target = PhysicalPosition::new(current.x + dx, current.y + dy);
            tracked.window.set_outer_position(target);
            tracked.position = Some(target);
        }
    }

    /// Any window closing ends the application.
    pub fn on_close_requested(&mut self, window: WindowId) {
        if self.get(window).is_some() {
            self.quit_requested = true;
        }
    }

    /// `true` once a close was requested on any window.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeWindow {
        id: WindowId,
        position: Cell<PhysicalPosition<i32>>,
        moves: Cell<u32>,
    }

    impl FakeWindow {
        fn new(id: u64, x: i32, y: i32) -> Self {
            Self {
                id: WindowId::from(id),
                position: Cell::new(PhysicalPosition::new(x, y)),
                moves: Cell::new(0),
            }
        }
    }

    impl CoordinatedWindow for &FakeWindow {
        fn id(&self) -> WindowId {
            self.id
        }

        fn outer_position(&self) -> Option<PhysicalPosition<i32>> {
            Some(self.position.get())
        }

        fn set_outer_position(&self, position: PhysicalPosition<i32>) {
            self.position.set(position);
            self.moves.set(self.moves.get() + 1);
        }
    }

    #[test]
    fn moving_one_window_moves_the_others_by_the_same_offset() {
        let a = FakeWindow::new(1, 0, 0);
        let b = FakeWindow::new(2, 1034, 0);
        let c = FakeWindow::new(3, 2068, 0);
        let mut coordinator = MultiWindowCoordinator::new([&a, &b, &c]);
        coordinator.on_window_moved(a.id, PhysicalPosition::new(0, 0));

        a.position.set(PhysicalPosition::new(50, 20));
        coordinator.on_window_moved(a.id, PhysicalPosition::new(50, 20));

        assert_eq!(b.position.get(), PhysicalPosition::new(1084, 20));
        assert_eq!(c.position.get(), PhysicalPosition::new(2118, 20));
        assert_eq!(a.moves.get(), 0);
    }

    #[test]
    fn echoed_move_events_do_not_ripple() {
        let a = FakeWindow::new(1, 0, 0);
        let b = FakeWindow::new(2, 100, 0);
        let mut coordinator = MultiWindowCoordinator::new([&a, &b]);
        coordinator.on_window_moved(a.id, PhysicalPosition::new(0, 0));
        coordinator.on_window_moved(b.id, PhysicalPosition::new(100, 0));

        coordinator.on_window_moved(a.id, PhysicalPosition::new(10, 10));
        assert_eq!(b.moves.get(), 1);

        // The platform reports the move we requested for `b`.
        coordinator.on_window_moved(b.id, PhysicalPosition::new(110, 10));
        assert_eq!(a.moves.get(), 0);
        assert_eq!(b.moves.get(), 1);
    }

    #[test]
    fn initial_placement_is_not_propagated() {
        let a = FakeWindow::new(1, 0, 0);
        let b = FakeWindow::new(2, 1040, 0);
        let mut coordinator = MultiWindowCoordinator::new([&a, &b]);

        // The window manager offsets both windows by their decorations.
        coordinator.on_window_moved(a.id, PhysicalPosition::new(8, 31));
        coordinator.on_window_moved(b.id, PhysicalPosition::new(1048, 31));
        assert_eq!((a.moves.get(), b.moves.get()), (0, 0));

        coordinator.on_window_moved(a.id, PhysicalPosition::new(18, 31));
        assert_eq!(b.position.get(), PhysicalPosition::new(1058, 31));
    }

    #[test]
    fn unknown_window_is_ignored() {
        let a = FakeWindow::new(1, 0, 0);
        let mut coordinator = MultiWindowCoordinator::new([&a]);
        coordinator.on_window_moved(WindowId::from(9), PhysicalPosition::new(5, 5));
        coordinator.on_close_requested(WindowId::from(9));
        assert!(!coordinator.quit_requested());
    }

    #[test]
    fn close_on_any_window_quits() {
        let a = FakeWindow::new(1, 0, 0);
        let b = FakeWindow::new(2, 100, 0);
        let mut coordinator = MultiWindowCoordinator::new([&a, &b]);
        coordinator.on_close_requested(b.id);
        assert!(coordinator.quit_requested());
    }
}
