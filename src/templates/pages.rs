use maud::{DOCTYPE, Markup, html};
use snippetbox_core::Validator;
use snippetbox_models::{Snippet, SnippetCreateForm, UserLoginForm, UserSignupForm};

use super::{TemplateData, human_date};
use crate::middleware::csrf::CSRF_FORM_FIELD;

const EXPIRY_CHOICES: [(i32, &str); 3] = [(365, "One Year"), (7, "One Week"), (1, "One Day")];

fn base(title: &str, data: &TemplateData, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " - Snippetbox" }
                link rel="stylesheet" href="/static/css/main.css";
                link rel="shortcut icon" href="/static/img/favicon.ico" type="image/x-icon";
                link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Ubuntu+Mono:400,700";
            }
            body {
                header {
                    h1 { a href="/" { "Snippetbox" } }
                }
                (nav(data))
                main {
                    @if let Some(flash) = &data.flash {
                        div.flash { (flash) }
                    }
                    (content)
                }
                footer {
                    "Powered by " a href="https://www.rust-lang.org/" { "Rust" } " in " (data.current_year)
                }
            }
        }
    }
}

fn nav(data: &TemplateData) -> Markup {
    html! {
        nav {
            div {
                a href="/" { "Home" }
                @if data.is_authenticated {
                    a href="/snippet/create" { "Create snippet" }
                }
            }
            div {
                @if data.is_authenticated {
                    form action="/user/logout" method="POST" {
                        (csrf_field(data))
                        button { "Logout" }
                    }
                } @else {
                    a href="/user/signup" { "Signup" }
                    a href="/user/login" { "Login" }
                }
            }
        }
    }
}

fn csrf_field(data: &TemplateData) -> Markup {
    html! {
        input type="hidden" name=(CSRF_FORM_FIELD) value=(data.csrf_token);
    }
}

fn field_error(validator: &Validator, field: &str) -> Markup {
    html! {
        @if let Some(message) = validator.field_error(field) {
            label.error { (message) }
        }
    }
}

pub fn home(data: &TemplateData, snippets: &[Snippet]) -> Markup {
    let content = html! {
        h2 { "Latest Snippets" }
        @if snippets.is_empty() {
            p { "There's nothing to see here... yet!" }
        } @else {
            table {
                tr {
                    th { "Title" }
                    th { "Created" }
                    th { "ID" }
                }
                @for snippet in snippets {
                    tr {
                        td { a href={ "/snippet/view/" (snippet.id) } { (snippet.title) } }
                        td { (human_date(&snippet.created)) }
                        td { "#" (snippet.id) }
                    }
                }
            }
        }
    };
    base("Home", data, content)
}

pub fn view(data: &TemplateData, snippet: &Snippet) -> Markup {
    let content = html! {
        div.snippet {
            div.metadata {
                strong { (snippet.title) }
                span { "#" (snippet.id) }
            }
            pre { code { (snippet.content) } }
            div.metadata {
                time { "Created: " (human_date(&snippet.created)) }
                time { "Expires: " (human_date(&snippet.expires)) }
            }
        }
    };
    base(&format!("Snippet #{}", snippet.id), data, content)
}

pub fn create(data: &TemplateData, form: &SnippetCreateForm) -> Markup {
    let v = &form.validator;
    let content = html! {
        form action="/snippet/create" method="POST" {
            (csrf_field(data))
            div {
                label { "Title:" }
                (field_error(v, "title"))
                input type="text" name="title" value=(form.title);
            }
            div {
                label { "Content:" }
                (field_error(v, "content"))
                textarea name="content" { (form.content) }
            }
            div {
                label { "Delete in:" }
                (field_error(v, "expires"))
                @for (days, label) in EXPIRY_CHOICES {
                    input type="radio" name="expires" value=(days) checked[form.expires == days];
                    " " (label) " "
                }
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    };
    base("Create a New Snippet", data, content)
}

pub fn signup(data: &TemplateData, form: &UserSignupForm) -> Markup {
    let v = &form.validator;
    let content = html! {
        form action="/user/signup" method="POST" novalidate {
            (csrf_field(data))
            div {
                label { "Name:" }
                (field_error(v, "name"))
                input type="text" name="name" value=(form.name);
            }
            div {
                label { "Email:" }
                (field_error(v, "email"))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(v, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Signup";
            }
        }
    };
    base("Signup", data, content)
}

pub fn login(data: &TemplateData, form: &UserLoginForm) -> Markup {
    let v = &form.validator;
    let content = html! {
        form action="/user/login" method="POST" novalidate {
            (csrf_field(data))
            @for message in v.non_field_errors() {
                div.error { (message) }
            }
            div {
                label { "Email:" }
                (field_error(v, "email"))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(v, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Login";
            }
        }
    };
    base("Login", data, content)
}
