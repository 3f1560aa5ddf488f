//! Routes and sidebar of the console shell

use keyconsole_client::Session;
use keyconsole_core::User;
use std::fmt;
use tracing::debug;

/// A screen of the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Dashboard,
    /// `/items`
    Items,
    /// `/settings`
    Settings,
    /// `/admin`
    Admin,
    /// `/keys`
    Keys,
    /// `/login`
    Login,
    /// `/register`
    Register,
    /// Anything else
    NotFound(String),
}

impl Route {
    /// Map a path to its route; trailing slashes and query strings are ignored
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Dashboard,
            "/items" => Self::Items,
            "/settings" => Self::Settings,
            "/admin" => Self::Admin,
            "/keys" => Self::Keys,
            "/login" => Self::Login,
            "/register" => Self::Register,
            _ => Self::NotFound(path.to_string()),
        }
    }

    /// Canonical path
    pub fn path(&self) -> &str {
        match self {
            Self::Dashboard => "/",
            Self::Items => "/items",
            Self::Settings => "/settings",
            Self::Admin => "/admin",
            Self::Keys => "/keys",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::NotFound(path) => path,
        }
    }

    /// Reachable without a session
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Register | Self::NotFound(_))
    }

    /// Rendered inside the sidebar layout
    pub const fn uses_layout(&self) -> bool {
        matches!(
            self,
            Self::Dashboard | Self::Items | Self::Settings | Self::Admin | Self::Keys
        )
    }

    /// Heading shown for the route
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Items => "Items",
            Self::Settings => "User settings",
            Self::Admin => "Admin",
            Self::Keys => "Key management",
            Self::Login => "Log in",
            Self::Register => "Sign up",
            Self::NotFound(_) => "Not found",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of navigating to a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Show the route
    Render(Route),
    /// Go to another route instead
    Redirect(Route),
}

/// Entry of the sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    /// Label
    pub title: &'static str,
    /// Target
    pub route: Route,
}

impl SidebarItem {
    fn new(route: Route) -> Self {
        Self {
            title: route.title(),
            route,
        }
    }
}

/// Sidebar entries for `user`; the admin entry is only offered to superusers
pub fn sidebar(user: Option<&User>) -> Vec<SidebarItem> {
    let mut items = vec![
        SidebarItem::new(Route::Dashboard),
        SidebarItem::new(Route::Items),
        SidebarItem::new(Route::Settings),
    ];
    if user.is_some_and(|user| user.is_superuser) {
        items.push(SidebarItem::new(Route::Admin));
    }
    items.push(SidebarItem::new(Route::Keys));
    items
}

/// Route table plus the session gate
#[derive(Debug, Clone)]
pub struct NavigationShell {
    session: Session,
    current: Route,
}

impl NavigationShell {
    /// Shell starting at the dashboard
    pub const fn new(session: Session) -> Self {
        Self {
            session,
            current: Route::Dashboard,
        }
    }

    /// Route currently shown
    pub const fn current(&self) -> &Route {
        &self.current
    }

    /// Resolve `path` without changing the current route
    pub fn resolve(&self, path: &str) -> Resolution {
        let route = Route::parse(path);
        if route.uses_layout() && !self.session.is_authenticated() {
            debug!(%route, "no session, redirecting to login");
            return Resolution::Redirect(Route::Login);
        }
        Resolution::Render(route)
    }

    /// Navigate to `path`, following a redirect
    pub fn navigate(&mut self, path: &str) -> &Route {
        self.current = match self.resolve(path) {
            Resolution::Render(route) | Resolution::Redirect(route) => route,
        };
        &self.current
    }

    /// Whether `item` points at the current route
    pub fn is_active(&self, item: &SidebarItem) -> bool {
        item.route == self.current
    }
}
