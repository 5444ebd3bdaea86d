pub mod login;
pub mod logout;

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login::login_page,
        login::login_submit,
        logout::logout,
        logout::admin_redirect_to_login,
        logout::admin_post_to_login,
    ]
}
