use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::{achievement, achievement_cat};
use crate::error::AppError;
use crate::models::achievement::AchievementResponse;

/// Resolve each name to an achievement, creating the missing ones.
///
/// Returns one model per input name, in input order; repeated names map to
/// the same row. Concurrent writers creating the same name converge on a
/// single row through the unique index.
pub async fn get_or_create_achievements<C: ConnectionTrait>(
    db: &C,
    names: &[String],
) -> Result<Vec<achievement::Model>, AppError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut distinct: Vec<&String> = Vec::new();
    let mut seen = HashSet::new();
    for name in names {
        if seen.insert(name.as_str()) {
            distinct.push(name);
        }
    }

    let rows = distinct.iter().map(|name| achievement::ActiveModel {
        name: Set((*name).clone()),
        ..Default::default()
    });
    match achievement::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::column(achievement::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    let by_name: HashMap<String, achievement::Model> = achievement::Entity::find()
        .filter(achievement::Column::Name.is_in(distinct.iter().map(|n| n.as_str())))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.name.clone(), a))
        .collect();

    names
        .iter()
        .map(|name| {
            by_name.get(name).cloned().ok_or_else(|| {
                AppError::Internal(format!("Achievement '{name}' missing after upsert"))
            })
        })
        .collect()
}

/// Add one link per achievement id, duplicates included.
pub async fn link_achievements<C: ConnectionTrait>(
    db: &C,
    cat_id: i32,
    achievement_ids: &[i32],
) -> Result<(), AppError> {
    if achievement_ids.is_empty() {
        return Ok(());
    }

    let links = achievement_ids
        .iter()
        .map(|&achievement_id| achievement_cat::ActiveModel {
            achievement_id: Set(achievement_id),
            cat_id: Set(cat_id),
            ..Default::default()
        });
    achievement_cat::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Make the cat's links equal to the given set of achievement ids.
///
/// Links to achievements outside the set are removed; achievements in the
/// set that the cat does not hold yet get one link each. Existing links
/// that stay wanted are kept as they are.
pub async fn replace_links<C: ConnectionTrait>(
    db: &C,
    cat_id: i32,
    achievement_ids: &[i32],
) -> Result<(), AppError> {
    let wanted: HashSet<i32> = achievement_ids.iter().copied().collect();

    let mut delete = achievement_cat::Entity::delete_many()
        .filter(achievement_cat::Column::CatId.eq(cat_id));
    if !wanted.is_empty() {
        delete = delete.filter(achievement_cat::Column::AchievementId.is_not_in(wanted.iter().copied()));
    }
    delete.exec(db).await?;

    if wanted.is_empty() {
        return Ok(());
    }

    let held: HashSet<i32> = achievement_cat::Entity::find()
        .select_only()
        .column(achievement_cat::Column::AchievementId)
        .filter(achievement_cat::Column::CatId.eq(cat_id))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let mut missing: Vec<i32> = Vec::new();
    for id in achievement_ids {
        if !held.contains(id) && !missing.contains(id) {
            missing.push(*id);
        }
    }
    link_achievements(db, cat_id, &missing).await
}

/// Achievements of each given cat, in link order.
pub async fn achievements_by_cat<C: ConnectionTrait>(
    db: &C,
    cat_ids: &[i32],
) -> Result<HashMap<i32, Vec<AchievementResponse>>, AppError> {
    if cat_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = achievement_cat::Entity::find()
        .filter(achievement_cat::Column::CatId.is_in(cat_ids.iter().copied()))
        .find_also_related(achievement::Entity)
        .order_by_asc(achievement_cat::Column::Id)
        .all(db)
        .await?;

    let mut grouped: HashMap<i32, Vec<AchievementResponse>> = HashMap::new();
    for (link, achievement) in rows {
        if let Some(achievement) = achievement {
            grouped
                .entry(link.cat_id)
                .or_default()
                .push(achievement.into());
        }
    }
    Ok(grouped)
}

/// Achievements of a single cat, in link order.
pub async fn achievements_of_cat<C: ConnectionTrait>(
    db: &C,
    cat_id: i32,
) -> Result<Vec<AchievementResponse>, AppError> {
    Ok(achievements_by_cat(db, &[cat_id])
        .await?
        .remove(&cat_id)
        .unwrap_or_default())
}
