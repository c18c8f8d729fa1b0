// src/openapi.rs

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    error::ErrorBody,
    handlers::{admin, auth, categories, posts},
    models::{
        category::Category,
        media::MediaReference,
        post::{
            BlogPost, Difficulty, Locale, LocaleContent, PostContent, PostForm, PostPatch,
            PostStatus, RecipeMeta, StatusRequest,
        },
        user::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest},
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Food Blog API",
        version = "0.1.0",
        description = "Bilingual (English/Arabic) recipe blog: public reading API and admin authoring API"
    ),
    paths(
        auth::register,
        auth::login,
        auth::me,
        auth::update_me,
        posts::list_posts,
        posts::get_post,
        posts::record_view,
        categories::list_categories,
        categories::get_category,
        admin::list_posts,
        admin::create_post,
        admin::get_post,
        admin::update_post,
        admin::set_post_status,
        admin::delete_post,
        admin::upload_media,
    ),
    components(schemas(
        ErrorBody,
        PublicUser,
        AuthResponse,
        RegisterRequest,
        LoginRequest,
        UpdateProfileRequest,
        Locale,
        LocaleContent,
        PostContent,
        PostStatus,
        Difficulty,
        RecipeMeta,
        BlogPost,
        PostForm,
        PostPatch,
        StatusRequest,
        Category,
        MediaReference,
    )),
    tags(
        (name = "Auth", description = "Registration, login and the caller's account"),
        (name = "Posts", description = "Public, published posts"),
        (name = "Categories", description = "Bilingual category catalog"),
        (name = "Admin", description = "Post authoring and media uploads"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
