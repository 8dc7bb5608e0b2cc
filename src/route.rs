//! Screens the board can be on, and the seam for switching between them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

pub trait Navigator {
    fn navigate(&mut self, route: Route);
}
