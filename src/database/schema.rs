// Table definitions. Executed in order by `DatabaseManager::migrate`.

pub const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS professions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS student_groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_name TEXT NOT NULL UNIQUE,
        start_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        end_date TEXT,
        profession_id INTEGER REFERENCES professions (id) ON DELETE SET NULL
    )",
    "CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        middle_name TEXT,
        last_name TEXT NOT NULL,
        age INTEGER,
        group_id INTEGER REFERENCES student_groups (id) ON DELETE SET NULL
    )",
    "CREATE TABLE IF NOT EXISTS student_cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL UNIQUE REFERENCES students (id) ON DELETE CASCADE,
        number TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS teachers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        middle_name TEXT,
        last_name TEXT NOT NULL,
        age INTEGER,
        phone TEXT NOT NULL,
        email TEXT
    )",
    // Composite keys; SQLite permits NULL in non-integer primary key columns,
    // which is what ON DELETE SET NULL relies on here.
    "CREATE TABLE IF NOT EXISTS teachers_groups (
        teacher_id INTEGER REFERENCES teachers (id) ON DELETE SET NULL ON UPDATE CASCADE,
        group_id INTEGER REFERENCES student_groups (id) ON DELETE SET NULL ON UPDATE CASCADE,
        date_start TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (teacher_id, group_id)
    )",
    "CREATE TABLE IF NOT EXISTS teachers_professions (
        teacher_id INTEGER REFERENCES teachers (id) ON DELETE SET NULL ON UPDATE CASCADE,
        profession_id INTEGER REFERENCES professions (id) ON DELETE SET NULL ON UPDATE CASCADE,
        notions TEXT,
        PRIMARY KEY (teacher_id, profession_id)
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS api_keys (
        api_key TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('admin', 'user'))
    )",
];
