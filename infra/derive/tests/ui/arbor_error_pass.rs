use arbor_derive::arbor_error;
use std::borrow::Cow;

#[arbor_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Shutdown{}: {message}", format_context(.context))]
    Shutdown { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let _ = DemoError::from("internal");
    let _ = DemoError::from(String::from("owned"));
}
