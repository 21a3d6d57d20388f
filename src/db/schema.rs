// SQLite schema definitions. Timestamps are stored as RFC 3339 text.

diesel::table! {
    opportunities (id) {
        id -> Text,
        title -> Text,
        company -> Text,
        value -> Double,
        stage -> Text,
        probability -> Integer,
        contact_name -> Nullable<Text>,
        contact_title -> Nullable<Text>,
        contact_id -> Nullable<Text>,
        expected_close_date -> Nullable<Text>,
        description -> Nullable<Text>,
        last_activity -> Nullable<Text>,
        days_in_stage -> Nullable<Integer>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    contacts (id) {
        id -> Text,
        full_name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        mobile_phone -> Nullable<Text>,
        work_phone -> Nullable<Text>,
        fax -> Nullable<Text>,
        company -> Nullable<Text>,
        job_title -> Nullable<Text>,
        birthday -> Nullable<Text>,
        location -> Nullable<Text>,
        linkedin_url -> Nullable<Text>,
        whatsapp -> Nullable<Text>,
        contact_frequency -> Nullable<Text>,
        last_contacted_at -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(opportunities, contacts);
