//! RESTful resource routes.

use std::fmt;

use http::Method;
use junction_core::{DispatchContext, Fault, HandlerResult};

/// One action of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    /// `GET base` and `GET base/index`.
    Index,
    /// `GET base/new`.
    New,
    /// `POST base`.
    Create,
    /// `GET base/:id`.
    Show,
    /// `GET base/:id/edit`.
    Edit,
    /// `PUT base/:id`.
    Update,
    /// `DELETE base/:id`.
    Delete,
}

impl ResourceAction {
    /// Every action, in registration order.
    ///
    /// `New` precedes `Show` so that `base/new` is not captured as an id.
    pub const ALL: [Self; 7] = [
        Self::Index,
        Self::New,
        Self::Create,
        Self::Show,
        Self::Edit,
        Self::Update,
        Self::Delete,
    ];

    /// Returns the verb and template suffix of each route for this action.
    pub fn routes(self) -> Vec<(Method, &'static str)> {
        match self {
            Self::Index => vec![(Method::GET, ""), (Method::GET, "index")],
            Self::New => vec![(Method::GET, "new")],
            Self::Create => vec![(Method::POST, "")],
            Self::Show => vec![(Method::GET, ":id")],
            Self::Edit => vec![(Method::GET, ":id/edit")],
            Self::Update => vec![(Method::PUT, ":id")],
            Self::Delete => vec![(Method::DELETE, ":id")],
        }
    }

    /// Returns the lowercase action name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::New => "new",
            Self::Create => "create",
            Self::Show => "show",
            Self::Edit => "edit",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A controller exposing the conventional resource actions.
///
/// Unimplemented actions answer 404. Override [`actions`](Self::actions)
/// to publish fewer routes.
///
/// # Example
///
/// ```
/// use junction_core::{response, DispatchContext, HandlerResult};
/// use junction_dispatch::{Dispatcher, Resource, ResourceAction};
///
/// struct Posts;
///
/// impl Resource for Posts {
///     fn actions(&self) -> Vec<ResourceAction> {
///         vec![ResourceAction::Index, ResourceAction::Show]
///     }
///
///     fn index(&self, _ctx: &mut DispatchContext) -> HandlerResult {
///         Ok(response::text("all posts"))
///     }
///
///     fn show(&self, ctx: &mut DispatchContext) -> HandlerResult {
///         Ok(response::text(format!("post {}", ctx.params().get_str("id").unwrap_or("?"))))
///     }
/// }
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.resource("posts", Posts).unwrap();
/// assert_eq!(dispatcher.routes().len(), 3);
/// ```
pub trait Resource<S = ()>: Send + Sync + 'static {
    /// The actions to publish.
    fn actions(&self) -> Vec<ResourceAction> {
        ResourceAction::ALL.to_vec()
    }

    /// Lists the collection.
    fn index(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Shows the creation form.
    fn new(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Creates a member.
    fn create(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Shows the member `:id`.
    fn show(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Shows the edit form for `:id`.
    fn edit(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Updates the member `:id`.
    fn update(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Deletes the member `:id`.
    fn delete(&self, _ctx: &mut DispatchContext<S>) -> HandlerResult {
        Err(Fault::not_found())
    }

    /// Routes `action` to its method.
    fn call(&self, action: ResourceAction, ctx: &mut DispatchContext<S>) -> HandlerResult {
        match action {
            ResourceAction::Index => self.index(ctx),
            ResourceAction::New => self.new(ctx),
            ResourceAction::Create => self.create(ctx),
            ResourceAction::Show => self.show(ctx),
            ResourceAction::Edit => self.edit(ctx),
            ResourceAction::Update => self.update(ctx),
            ResourceAction::Delete => self.delete(ctx),
        }
    }
}
