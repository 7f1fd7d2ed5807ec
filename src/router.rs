use log::debug;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Home,
    Login,
    Dashboard,
    NotFound,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::NotFound => "/404",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Login => "login",
            Route::Dashboard => "dashboard",
            Route::NotFound => "not-found",
        }
    }

    /// Query string, fragment and trailing slashes are ignored.
    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        match path {
            "" => Route::Home,
            "/login" => Route::Login,
            "/dashboard" => Route::Dashboard,
            _ => Route::NotFound,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of running a route's guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

/// 路由守卫：仪表盘需要登录，登录页仅限匿名用户
pub fn guard(route: Route, authenticated: bool) -> Resolution {
    match (route, authenticated) {
        (Route::Home, true) => Resolution::Redirect(Route::Dashboard),
        (Route::Home, false) => Resolution::Redirect(Route::Login),
        (Route::Login, true) => Resolution::Redirect(Route::Dashboard),
        (Route::Dashboard, false) => Resolution::Redirect(Route::Login),
        (route, _) => Resolution::Render(route),
    }
}

/// Follows guard redirects from `path` to the view that will be rendered.
pub fn resolve(path: &str, authenticated: bool) -> Route {
    let mut route = Route::from_path(path);
    // 守卫之间不存在循环，几次跳转即可收敛
    for _ in 0..4 {
        match guard(route, authenticated) {
            Resolution::Render(target) => return target,
            Resolution::Redirect(target) => {
                debug!("Redirecting {} -> {}", route, target);
                route = target;
            }
        }
    }
    route
}
