diesel::table! {
    modulemds (id) {
        id -> Integer,
        name -> Text,
        stream -> Text,
        version -> BigInt,
        context -> Text,
        arch -> Text,
        artifacts -> Text,
        dependencies -> Text,
        artifact_digest -> Text,
        artifact_size -> BigInt,
        artifact_path -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    modulemd_defaults (id) {
        id -> Integer,
        module -> Text,
        stream -> Text,
        profiles -> Text,
        digest -> Text,
        artifact_size -> BigInt,
        artifact_path -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(modulemds, modulemd_defaults);
