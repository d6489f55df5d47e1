// Esquema Diesel para SQLite. Tabla única: workflows. Las columnas
// desnormalizadas (state, template, current_operation) sirven para contar
// sin deserializar; `xml` guarda la instancia completa.
diesel::table! {
    workflows (id) {
        id -> BigInt,
        state -> Text,
        template -> Nullable<Text>,
        current_operation -> Nullable<Text>,
        parent_id -> Nullable<BigInt>,
        xml -> Text,
    }
}
