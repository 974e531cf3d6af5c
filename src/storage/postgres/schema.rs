//! Diesel schema for the bot tables.

diesel::table! {
    /// Organizations grouping managers and employees.
    organizations (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Unique organization name.
        #[max_length = 255]
        name -> Varchar,
    }
}

diesel::table! {
    /// Registered users keyed by chat platform id.
    users (id) {
        /// Chat platform user id.
        id -> Int8,
        /// Display name typed at registration.
        #[max_length = 255]
        full_name -> Varchar,
        /// Role name.
        #[max_length = 20]
        role -> Varchar,
        /// Organization for employees and managers.
        organization_id -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Tasks handed out by managers to employees.
    tasks (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Task description.
        description -> Text,
        /// Assigned employee.
        employee_id -> Int8,
        /// Manager who handed out the task.
        manager_id -> Int8,
        /// Organization shared by both parties.
        organization_id -> Int8,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(users -> organizations (organization_id));
diesel::joinable!(tasks -> organizations (organization_id));

diesel::allow_tables_to_appear_in_same_query!(organizations, users, tasks);
