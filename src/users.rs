use diesel::prelude::*;

use crate::models::{NewUser, Role, User};
use crate::schema::users;

pub fn insert_user(conn: &mut SqliteConnection, new_user: &NewUser) -> QueryResult<i32> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(users::id)
        .get_result(conn)
}

pub fn find_by_email(conn: &mut SqliteConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn role_for_email(conn: &mut SqliteConnection, email: &str) -> QueryResult<Option<Role>> {
    users::table
        .filter(users::email.eq(email))
        .select(users::role)
        .first(conn)
        .optional()
}
