use crate::commands::{paths, schema};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "entities",
            groups: schema::ENTITIES_EXAMPLES,
        },
        CommandExample {
            name: "validate",
            groups: schema::VALIDATE_EXAMPLES,
        },
        CommandExample {
            name: "tree",
            groups: paths::TREE_EXAMPLES,
        },
        CommandExample {
            name: "key",
            groups: paths::KEY_EXAMPLES,
        },
    ]
}
